//! Google Docs v1 REST client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{BatchUpdateRequest, Document, Request};
use crate::error::{http_error, ServiceError};
use crate::google::auth::{scopes, AuthenticationManager};

const DOCS_API: &str = "https://docs.googleapis.com/v1/documents";

/// Read and edit a Google Docs document
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetch the full document tree
    async fn get_document(&self, document_id: &str) -> Result<Document, ServiceError>;

    /// Apply requests atomically, in order
    async fn batch_update(&self, document_id: &str, requests: &[Request]) -> Result<(), ServiceError>;
}

pub struct DocsClient {
    http_client: Client,
    auth_manager: Arc<AuthenticationManager>,
}

impl DocsClient {
    pub fn new(http_client: Client, auth_manager: Arc<AuthenticationManager>) -> Self {
        Self {
            http_client,
            auth_manager,
        }
    }

    fn document_url(document_id: &str) -> String {
        format!("{}/{}", DOCS_API, urlencoding::encode(document_id))
    }

    fn batch_update_url(document_id: &str) -> String {
        format!("{}/{}:batchUpdate", DOCS_API, urlencoding::encode(document_id))
    }

    async fn token(&self) -> Result<String, ServiceError> {
        self.auth_manager
            .get_token(&[scopes::DOCUMENTS, scopes::DRIVE])
            .await
    }
}

#[async_trait]
impl DocumentService for DocsClient {
    async fn get_document(&self, document_id: &str) -> Result<Document, ServiceError> {
        let response = self
            .http_client
            .get(Self::document_url(document_id))
            .bearer_auth(self.token().await?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn batch_update(&self, document_id: &str, requests: &[Request]) -> Result<(), ServiceError> {
        debug!("batchUpdate {} with {} request(s)", document_id, requests.len());
        let response = self
            .http_client
            .post(Self::batch_update_url(document_id))
            .bearer_auth(self.token().await?)
            .json(&BatchUpdateRequest { requests })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        Ok(())
    }
}
