// POST /classify-item handler

use std::convert::Infallible;

use tracing::info;

use super::{failure, load_session, model_image_url, save_to_session, success};
use crate::error::ServiceError;
use crate::models::{ClassifyItemRequest, ClassifyItemResponse, ItemType};
use crate::state::AppState;

pub async fn classify_item_handler(
    state: AppState,
    request: ClassifyItemRequest,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /classify-item");

    match classify_item(&state, request).await {
        Ok(classification) => Ok(success(&ClassifyItemResponse {
            success: true,
            classification,
        })),
        Err(e) => Ok(failure("Error classifying item", &e, state.expose_errors())),
    }
}

async fn classify_item(state: &AppState, request: ClassifyItemRequest) -> Result<ItemType, ServiceError> {
    let session_id = request.session_id.filter(|id| !id.trim().is_empty());
    let image_url = request.image_url.filter(|url| !url.trim().is_empty());

    match (session_id, image_url) {
        (Some(session_id), _) => {
            let session = load_session(state, session_id.trim()).await?;
            let url = model_image_url(state, &session).await?;
            let item_type = state.analyst.classify(&url).await?;
            save_to_session(&state.sessions, &session.id, |s| s.item_type = item_type).await;
            info!("Session {} classified as {}", session.id, item_type);
            Ok(item_type)
        }
        (None, Some(image_url)) => state.analyst.classify(image_url.trim()).await,
        (None, None) => Err(ServiceError::InvalidRequest(
            "imageUrl or sessionId is required".to_string(),
        )),
    }
}
