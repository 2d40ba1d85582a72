//! Google OAuth token management (ADC or an explicit service account)

use gcp_auth::{AuthenticationManager as GcpAuthManager, CustomServiceAccount};

use crate::error::ServiceError;

/// OAuth scopes used by the Google clients in this crate
pub mod scopes {
    pub const CLOUD_PLATFORM: &str = "https://www.googleapis.com/auth/cloud-platform";
    pub const DOCUMENTS: &str = "https://www.googleapis.com/auth/documents";
    pub const DRIVE: &str = "https://www.googleapis.com/auth/drive";
    pub const STORAGE_READ_WRITE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
}

/// Manages GCP access tokens
///
/// Wraps `gcp_auth::AuthenticationManager`, which caches tokens per scope set
/// and refreshes them when they expire.
///
/// Credentials come from either:
/// - Application Default Credentials (`GOOGLE_APPLICATION_CREDENTIALS`,
///   `gcloud auth application-default login`, or the metadata server)
/// - A service-account key supplied as JSON (the Docs/Drive credentials secret)
pub struct AuthenticationManager {
    inner: GcpAuthManager,
}

impl AuthenticationManager {
    /// Discover credentials using the standard ADC flow
    ///
    /// # Errors
    /// Returns an error if no valid credentials can be found.
    pub async fn new() -> Result<Self, ServiceError> {
        let inner = GcpAuthManager::new()
            .await
            .map_err(|e| ServiceError::AuthenticationError(format!("Failed to initialize ADC: {}", e)))?;

        Ok(Self { inner })
    }

    /// Build a manager from a service-account key in JSON form
    ///
    /// # Errors
    /// Returns an error if the JSON is not a valid service-account key.
    pub fn from_service_account_json(json: &str) -> Result<Self, ServiceError> {
        let account = CustomServiceAccount::from_json(json).map_err(|e| {
            ServiceError::AuthenticationError(format!("Invalid service account credentials: {}", e))
        })?;

        Ok(Self {
            inner: GcpAuthManager::from(account),
        })
    }

    /// Get an access token for the given scopes
    ///
    /// # Errors
    /// Returns an error if token retrieval or refresh fails.
    pub async fn get_token(&self, scopes: &[&str]) -> Result<String, ServiceError> {
        let token = self
            .inner
            .get_token(scopes)
            .await
            .map_err(|e| ServiceError::AuthenticationError(format!("Failed to get token: {}", e)))?;

        Ok(token.as_str().to_string())
    }
}
