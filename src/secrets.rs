//! Secret lookup: environment variables or Google Secret Manager

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{http_error, ServiceError};
use crate::google::auth::{scopes, AuthenticationManager};

/// Names of the secrets the service reads at startup
pub mod names {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const GOOGLE_DOCS_CREDENTIALS: &str = "GOOGLE_DOCS_CREDENTIALS";
    pub const WORDPRESS_USERNAME: &str = "WORDPRESS_USERNAME";
    pub const WORDPRESS_APP_PASSWORD: &str = "WORDPRESS_APP_PASSWORD";
}

/// A place secrets can be read from
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch a secret; `Ok(None)` when it is not defined
    async fn get(&self, name: &str) -> Result<Option<String>, ServiceError>;

    /// Fetch a secret that must exist
    async fn require(&self, name: &str) -> Result<String, ServiceError> {
        self.get(name)
            .await?
            .ok_or_else(|| ServiceError::ConfigError(format!("Secret '{}' is not defined", name)))
    }
}

/// Secrets from process environment variables
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

#[async_trait]
impl SecretSource for EnvSecrets {
    async fn get(&self, name: &str) -> Result<Option<String>, ServiceError> {
        Ok(std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Secrets from Google Secret Manager (latest version)
pub struct SecretManagerSecrets {
    http_client: Client,
    auth_manager: Arc<AuthenticationManager>,
    project_id: String,
}

impl SecretManagerSecrets {
    pub fn new(http_client: Client, auth_manager: Arc<AuthenticationManager>, project_id: String) -> Self {
        Self {
            http_client,
            auth_manager,
            project_id,
        }
    }

    fn build_access_url(&self, name: &str) -> String {
        format!(
            "https://secretmanager.googleapis.com/v1/projects/{}/secrets/{}/versions/latest:access",
            self.project_id, name
        )
    }
}

#[async_trait]
impl SecretSource for SecretManagerSecrets {
    async fn get(&self, name: &str) -> Result<Option<String>, ServiceError> {
        let token = self.auth_manager.get_token(&[scopes::CLOUD_PLATFORM]).await?;

        let response = self
            .http_client
            .get(self.build_access_url(name))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Secret '{}' not found in project {}", name, self.project_id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let body: AccessSecretVersionResponse = response.json().await?;
        let value = decode_payload(&body.payload.data)?;
        info!("Secret '{}' loaded from Secret Manager", name);
        Ok(Some(value))
    }
}

fn decode_payload(data: &str) -> Result<String, ServiceError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| ServiceError::InvalidResponse(format!("Secret payload is not base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ServiceError::InvalidResponse(format!("Secret payload is not UTF-8: {}", e)))?;
    Ok(text.trim().to_string())
}
