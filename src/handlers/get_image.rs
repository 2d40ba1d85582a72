// GET /image/{sessionId} handler

use std::convert::Infallible;

use warp::http::{header, Response, StatusCode};
use warp::Reply;

use super::failure;
use crate::error::ServiceError;
use crate::state::AppState;

pub async fn get_image_handler(session_id: String, state: AppState) -> Result<warp::reply::Response, Infallible> {
    let expose = state.expose_errors();
    // only live sessions have their image served
    if state.sessions.get(&session_id).await.is_none() {
        return Ok(failure(
            "Error loading image",
            &ServiceError::NotFound("Image not found".to_string()),
            expose,
        )
        .into_response());
    }

    match state.images.get(&session_id).await {
        Ok(Some(image)) => {
            let response = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, image.content_type.as_str())
                .header(header::CACHE_CONTROL, "private, max-age=3600")
                .body(image.bytes);
            match response {
                Ok(response) => Ok(response.into_response()),
                Err(e) => Ok(failure(
                    "Error loading image",
                    &ServiceError::InvalidResponse(e.to_string()),
                    expose,
                )
                .into_response()),
            }
        }
        Ok(None) => Ok(failure(
            "Error loading image",
            &ServiceError::NotFound("Image not found".to_string()),
            expose,
        )
        .into_response()),
        Err(e) => Ok(failure("Error loading image", &e, expose).into_response()),
    }
}
