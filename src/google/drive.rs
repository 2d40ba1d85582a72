//! Google Drive v3: template copies, folder moves, PDF export and upload

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{http_error, ServiceError};
use crate::google::auth::{scopes, AuthenticationManager};

const FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3/files";
const PDF_MIME: &str = "application/pdf";

/// The subset of Drive file metadata we request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[async_trait]
pub trait DriveService: Send + Sync {
    /// Copy a file (shared drives included) under a new name
    async fn copy_file(&self, file_id: &str, name: &str) -> Result<DriveFile, ServiceError>;

    /// Put the file in `folder_id`, removing it from its current parents
    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<(), ServiceError>;

    /// Export a Google Docs file as PDF bytes
    async fn export_pdf(&self, file_id: &str) -> Result<Vec<u8>, ServiceError>;

    /// Create a PDF file in `folder_id`
    async fn upload_pdf(&self, name: &str, folder_id: &str, pdf: Vec<u8>) -> Result<DriveFile, ServiceError>;
}

pub struct DriveClient {
    http_client: Client,
    auth_manager: Arc<AuthenticationManager>,
}

impl DriveClient {
    pub fn new(http_client: Client, auth_manager: Arc<AuthenticationManager>) -> Self {
        Self {
            http_client,
            auth_manager,
        }
    }

    fn file_url(file_id: &str) -> String {
        format!("{}/{}", FILES_API, urlencoding::encode(file_id))
    }

    async fn token(&self) -> Result<String, ServiceError> {
        self.auth_manager.get_token(&[scopes::DRIVE]).await
    }

    async fn get_parents(&self, token: &str, file_id: &str) -> Result<Vec<String>, ServiceError> {
        let response = self
            .http_client
            .get(Self::file_url(file_id))
            .query(&[("fields", "id,parents"), ("supportsAllDrives", "true")])
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        let file: DriveFile = response.json().await?;
        Ok(file.parents)
    }
}

#[async_trait]
impl DriveService for DriveClient {
    async fn copy_file(&self, file_id: &str, name: &str) -> Result<DriveFile, ServiceError> {
        let response = self
            .http_client
            .post(format!("{}/copy", Self::file_url(file_id.trim())))
            .query(&[("fields", "id,webViewLink"), ("supportsAllDrives", "true")])
            .bearer_auth(self.token().await?)
            .json(&json!({ "name": name }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let file: DriveFile = response.json().await?;
        info!("Copied template {} to {}", file_id, file.id);
        Ok(file)
    }

    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<(), ServiceError> {
        let token = self.token().await?;
        let previous_parents = self.get_parents(&token, file_id).await?.join(",");

        let response = self
            .http_client
            .patch(Self::file_url(file_id))
            .query(&[
                ("addParents", folder_id),
                ("removeParents", previous_parents.as_str()),
                ("supportsAllDrives", "true"),
                ("fields", "id,parents"),
            ])
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        info!("Moved {} to folder {}", file_id, folder_id);
        Ok(())
    }

    async fn export_pdf(&self, file_id: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .http_client
            .get(format!("{}/export", Self::file_url(file_id)))
            .query(&[("mimeType", PDF_MIME)])
            .bearer_auth(self.token().await?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let pdf = response.bytes().await?;
        info!("Exported {} to PDF ({} bytes)", file_id, pdf.len());
        Ok(pdf.to_vec())
    }

    async fn upload_pdf(&self, name: &str, folder_id: &str, pdf: Vec<u8>) -> Result<DriveFile, ServiceError> {
        let boundary = format!("report-{}", Uuid::new_v4().simple());
        let metadata = json!({
            "name": name,
            "parents": [folder_id],
            "mimeType": PDF_MIME,
        });
        let body = multipart_related_body(&boundary, &metadata, &pdf)?;

        let response = self
            .http_client
            .post(UPLOAD_API)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,webViewLink"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(self.token().await?)
            .header(CONTENT_TYPE, format!("multipart/related; boundary={}", boundary))
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let file: DriveFile = response.json().await?;
        info!("Uploaded PDF {} as {}", name, file.id);
        Ok(file)
    }
}

/// Body for a Drive multipart upload: JSON metadata part, then the PDF
fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    pdf: &[u8],
) -> Result<Vec<u8>, ServiceError> {
    let metadata = serde_json::to_string(metadata)?;
    let mut body = Vec::with_capacity(pdf.len() + metadata.len() + 256);

    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {p}\r\n\r\n",
            b = boundary,
            m = metadata,
            p = PDF_MIME
        )
        .as_bytes(),
    );
    body.extend_from_slice(pdf);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    Ok(body)
}
