//! Error types shared by the service clients and handlers

use thiserror::Error;
use warp::http::StatusCode;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while serving a screening or report request
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Authentication/token issues
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failures against an upstream service
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid request parameters supplied by the caller
    #[error("{0}")]
    InvalidRequest(String),

    /// Session or resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Upstream answered, but not with something we can use
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Image storage failures
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provider-specific errors (OpenAI error objects, Google API errors)
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },
}

impl ServiceError {
    /// HTTP status this error maps to when it reaches a handler
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message is meant for the caller rather than the logs
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::StorageError(err.to_string())
    }
}

/// Read a non-success response into an `HttpError`
pub(crate) async fn http_error(response: reqwest::Response) -> ServiceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ServiceError::HttpError { status, body }
}
