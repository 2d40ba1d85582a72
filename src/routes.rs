// Route definitions and rejection handling

use std::convert::Infallible;

use serde::de::DeserializeOwned;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{
    InvalidHeader, LengthRequired, MethodNotAllowed, MissingHeader, PayloadTooLarge, UnsupportedMediaType,
};
use warp::{Filter, Rejection, Reply};

use crate::handlers;
use crate::models::ErrorResponse;
use crate::state::AppState;

/// Largest accepted JSON body
const JSON_BODY_LIMIT: u64 = 1024 * 1024;

pub fn configure_routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let max_upload = state.config.max_upload_bytes;

    // GET /
    let health = warp::path::end()
        .and(warp::get())
        .and_then(handlers::health_handler);

    // POST /upload-image
    let upload_image = warp::path("upload-image")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::multipart::form().max_length(max_upload))
        .and_then(handlers::upload_image_handler);

    // POST /classify-item
    let classify_item = warp::path("classify-item")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::classify_item_handler);

    // POST /generate-analysis
    let generate_analysis = warp::path("generate-analysis")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::generate_analysis_handler);

    // POST /enhance-analysis
    let enhance_analysis = warp::path("enhance-analysis")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::enhance_analysis_handler);

    // POST /generate-pdf
    let generate_pdf = warp::path("generate-pdf")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::generate_pdf_handler);

    // GET /image/{sessionId}
    let get_image = warp::path("image")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_image_handler);

    // Combine routes
    health
        .or(upload_image)
        .or(classify_item)
        .or(generate_analysis)
        .or(enhance_analysis)
        .or(generate_pdf)
        .or(get_image)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(JSON_BODY_LIMIT).and(warp::body::json())
}

/// Turn warp rejections into the JSON failure body
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large".to_string())
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "A content-length header is required".to_string())
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type".to_string())
    } else if let Some(e) = err.find::<InvalidHeader>() {
        (StatusCode::BAD_REQUEST, format!("Invalid header: {}", e.name()))
    } else if let Some(e) = err.find::<MissingHeader>() {
        (StatusCode::BAD_REQUEST, format!("Missing header: {}", e.name()))
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    let body = ErrorResponse {
        success: false,
        message,
        error: None,
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
