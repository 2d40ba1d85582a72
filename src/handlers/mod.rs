// Handlers module

pub mod analysis;
pub mod classify_item;
pub mod generate_pdf;
pub mod get_image;
pub mod health;
pub mod upload_image;

pub use analysis::{enhance_analysis_handler, generate_analysis_handler};
pub use classify_item::classify_item_handler;
pub use generate_pdf::generate_pdf_handler;
pub use get_image::get_image_handler;
pub use health::health_handler;
pub use upload_image::upload_image_handler;

use serde::Serialize;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::error::ServiceError;
use crate::models::ErrorResponse;
use crate::session::{Session, SessionStore};
use crate::state::AppState;

/// 200 with a JSON body
pub(crate) fn success<T: Serialize>(body: &T) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

/// `{success: false, message, error?}` with the error's status
///
/// Validation and not-found errors carry their own message; anything else
/// is reported under `context`, with details only when `expose` is set.
pub(crate) fn failure(context: &str, err: &ServiceError, expose: bool) -> WithStatus<Json> {
    let status = err.status_code();
    let message = if err.is_client_error() {
        warn!("{}: {}", context, err);
        err.to_string()
    } else {
        error!("{}: {}", context, err);
        context.to_string()
    };

    let body = ErrorResponse {
        success: false,
        message,
        error: expose.then(|| err.to_string()),
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// Required, non-blank request field
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::InvalidRequest(message.to_string()))
}

pub(crate) async fn load_session(state: &AppState, session_id: &str) -> Result<Session, ServiceError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ServiceError::NotFound("Session not found".to_string()))
}

/// Store a result on the session; warns when it expired mid-request
pub(crate) async fn save_to_session<F>(sessions: &SessionStore, session_id: &str, f: F) -> bool
where
    F: FnOnce(&mut Session),
{
    let saved = sessions.update(session_id, f).await;
    if !saved {
        warn!("Session {} expired before its result could be saved", session_id);
    }
    saved
}

/// URL the chat model can read for the session's image
///
/// Stored bytes are inlined as a data URL, since locally served images are
/// not reachable from outside.
pub(crate) async fn model_image_url(state: &AppState, session: &Session) -> Result<String, ServiceError> {
    match state.images.get(&session.id).await? {
        Some(image) => Ok(image.to_data_url()),
        None => Err(ServiceError::NotFound("Image not found for session".to_string())),
    }
}
