// POST /upload-image handler

use std::convert::Infallible;

use bytes::Buf;
use futures_util::{StreamExt, TryStreamExt};
use tracing::{info, warn};
use warp::multipart::{FormData, Part};

use super::{failure, success};
use crate::error::ServiceError;
use crate::models::{ItemType, UploadImageResponse};
use crate::session::Session;
use crate::state::AppState;
use crate::storage::{is_supported_image, StoredImage};

const IMAGE_FIELD: &str = "image";

pub async fn upload_image_handler(state: AppState, form: FormData) -> Result<impl warp::Reply, Infallible> {
    info!("POST /upload-image");

    match upload_image(&state, form).await {
        Ok(response) => Ok(success(&response)),
        Err(e) => Ok(failure("Error processing image", &e, state.expose_errors())),
    }
}

async fn upload_image(state: &AppState, form: FormData) -> Result<UploadImageResponse, ServiceError> {
    let image = read_image_field(form)
        .await?
        .ok_or_else(|| ServiceError::InvalidRequest("No image file uploaded".to_string()))?;

    let session_id = Session::new_id();
    let customer_image_url = state.images.put(&session_id, &image).await?;
    info!("Stored {} bytes for session {}", image.bytes.len(), session_id);

    let detection = match state.vision.detect(&image.bytes).await {
        Ok(detection) => detection,
        Err(e) => {
            state.discard_image(&session_id).await;
            return Err(e);
        }
    };
    let similar_image_urls = detection.similar_image_urls(state.config.vision_max_results as usize);

    let item_type = match state.analyst.classify(&image.to_data_url()).await {
        Ok(item_type) => item_type,
        Err(e) => {
            warn!("Classification failed for session {}, defaulting to Art: {}", session_id, e);
            ItemType::Art
        }
    };

    let mut session = Session::new(&session_id, &customer_image_url, &image.content_type);
    session.similar_image_urls = similar_image_urls.clone();
    session.item_type = item_type;
    state.sessions.insert(session).await;

    Ok(UploadImageResponse {
        success: true,
        session_id,
        customer_image_url,
        similar_image_urls,
        item_type,
    })
}

/// The `image` part of the form, if present
async fn read_image_field(mut form: FormData) -> Result<Option<StoredImage>, ServiceError> {
    while let Some(part) = form.next().await {
        let part = part.map_err(|e| ServiceError::InvalidRequest(format!("Invalid multipart body: {}", e)))?;
        if part.name() != IMAGE_FIELD {
            continue;
        }

        let content_type = part_content_type(&part);
        if !is_supported_image(&content_type) {
            return Err(ServiceError::InvalidRequest(format!(
                "Unsupported file type '{}'",
                content_type
            )));
        }

        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(chunk.chunk());
                Ok(acc)
            })
            .await
            .map_err(|e| ServiceError::InvalidRequest(format!("Error reading upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ServiceError::InvalidRequest("Uploaded image is empty".to_string()));
        }

        return Ok(Some(StoredImage::new(bytes, content_type)));
    }
    Ok(None)
}

/// Declared MIME type, else one guessed from the file extension
fn part_content_type(part: &Part) -> String {
    if let Some(content_type) = part.content_type() {
        return content_type.to_string();
    }
    let extension = part
        .filename()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}
