//! Google Cloud Storage image store

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::info;

use super::{extension_for, ImageStore, StoredImage};
use crate::error::{http_error, ServiceError};
use crate::google::auth::{scopes, AuthenticationManager};

const OBJECT_PREFIX: &str = "customer-images";

/// Stores images as objects in a GCS bucket via the JSON API
pub struct GcsImageStore {
    http_client: Client,
    auth_manager: Arc<AuthenticationManager>,
    bucket: String,
}

impl GcsImageStore {
    pub fn new(http_client: Client, auth_manager: Arc<AuthenticationManager>, bucket: String) -> Self {
        Self {
            http_client,
            auth_manager,
            bucket,
        }
    }

    fn object_name(session_id: &str, content_type: &str) -> String {
        format!("{}/{}.{}", OBJECT_PREFIX, session_id, extension_for(content_type))
    }

    fn upload_url(&self, object_name: &str) -> String {
        format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.bucket,
            urlencoding::encode(object_name)
        )
    }

    fn list_url(&self, session_id: &str) -> String {
        format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o?prefix={}&maxResults=1&fields=items(name)",
            self.bucket,
            urlencoding::encode(&format!("{}/{}.", OBJECT_PREFIX, session_id))
        )
    }

    fn object_url(&self, object_name: &str) -> String {
        format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o/{}",
            self.bucket,
            urlencoding::encode(object_name)
        )
    }

    fn media_url(&self, object_name: &str) -> String {
        format!("{}?alt=media", self.object_url(object_name))
    }

    fn public_url(&self, object_name: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, object_name)
    }

    /// Find the object stored for a session (its extension is not known up front)
    async fn find_object(&self, token: &str, session_id: &str) -> Result<Option<String>, ServiceError> {
        let response = self
            .http_client
            .get(self.list_url(session_id))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let listing: serde_json::Value = response.json().await?;
        Ok(listing["items"]
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item["name"].as_str())
            .map(str::to_string))
    }
}

#[async_trait]
impl ImageStore for GcsImageStore {
    async fn put(&self, session_id: &str, image: &StoredImage) -> Result<String, ServiceError> {
        let token = self.auth_manager.get_token(&[scopes::STORAGE_READ_WRITE]).await?;
        let object_name = Self::object_name(session_id, &image.content_type);

        let response = self
            .http_client
            .post(self.upload_url(&object_name))
            .bearer_auth(token)
            .header(CONTENT_TYPE, &image.content_type)
            .body(image.bytes.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        info!("Uploaded gs://{}/{}", self.bucket, object_name);
        Ok(self.public_url(&object_name))
    }

    async fn get(&self, session_id: &str) -> Result<Option<StoredImage>, ServiceError> {
        let token = self.auth_manager.get_token(&[scopes::STORAGE_READ_WRITE]).await?;
        let Some(object_name) = self.find_object(&token, session_id).await? else {
            return Ok(None);
        };

        let response = self
            .http_client
            .get(self.media_url(&object_name))
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;

        Ok(Some(StoredImage::new(bytes.to_vec(), content_type)))
    }

    async fn delete(&self, session_id: &str) -> Result<(), ServiceError> {
        let token = self.auth_manager.get_token(&[scopes::STORAGE_READ_WRITE]).await?;
        let Some(object_name) = self.find_object(&token, session_id).await? else {
            return Ok(());
        };

        let response = self
            .http_client
            .delete(self.object_url(&object_name))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(http_error(response).await);
        }

        info!("Deleted gs://{}/{}", self.bucket, object_name);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "gcs"
    }
}
