// GET / handler

use std::convert::Infallible;

use crate::models::HealthResponse;

pub async fn health_handler() -> Result<impl warp::Reply, Infallible> {
    Ok(super::success(&HealthResponse {
        success: true,
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
