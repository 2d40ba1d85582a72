//! WordPress REST client for the `appraisals` post type

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use super::types::{Media, PostData};
use crate::error::{http_error, ServiceError};

/// Access to appraisal posts and their media
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Title, date and ACF fields of a post
    async fn fetch_post(&self, post_id: &str) -> Result<PostData, ServiceError>;

    /// Source URL of a media item, `Ok(None)` when it cannot be resolved
    async fn media_url(&self, media_id: u64) -> Result<Option<String>, ServiceError>;

    /// Store the report links in the post's `pdflink` / `doclink` ACF fields
    async fn update_links(&self, post_id: &str, pdf_link: &str, doc_link: &str) -> Result<(), ServiceError>;
}

pub struct WordPressClient {
    http_client: Client,
    /// e.g. `https://example.com/wp-json/wp/v2`
    api_url: String,
    username: String,
    app_password: String,
}

impl WordPressClient {
    pub fn new(http_client: Client, api_url: &str, username: String, app_password: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            username,
            app_password,
        }
    }

    fn post_url(&self, post_id: &str) -> String {
        format!("{}/appraisals/{}", self.api_url, urlencoding::encode(post_id))
    }

    fn media_endpoint(&self, media_id: u64) -> String {
        format!("{}/media/{}", self.api_url, media_id)
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.http_client
            .get(url)
            .basic_auth(urlencoding::encode(&self.username), Some(&self.app_password))
    }
}

/// A post id WordPress does not know; an upstream failure, not a missing session
pub fn missing_post(post_id: &str) -> ServiceError {
    ServiceError::ProviderError {
        code: "rest_post_invalid_id".to_string(),
        message: format!("Post {} not found", post_id),
    }
}

#[async_trait]
impl PostRepository for WordPressClient {
    async fn fetch_post(&self, post_id: &str) -> Result<PostData, ServiceError> {
        let response = self
            .get(self.post_url(post_id))
            .query(&[("_fields", "title,date,acf")])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(missing_post(post_id));
        }
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn media_url(&self, media_id: u64) -> Result<Option<String>, ServiceError> {
        let response = self
            .get(self.media_endpoint(media_id))
            .query(&[("_fields", "source_url")])
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("Media {} lookup failed with status {}", media_id, response.status());
            return Ok(None);
        }
        let media: Media = response.json().await?;
        Ok(media.source_url.filter(|url| !url.is_empty()))
    }

    async fn update_links(&self, post_id: &str, pdf_link: &str, doc_link: &str) -> Result<(), ServiceError> {
        let response = self
            .http_client
            .post(self.post_url(post_id))
            .basic_auth(urlencoding::encode(&self.username), Some(&self.app_password))
            .json(&json!({ "acf": { "pdflink": pdf_link, "doclink": doc_link } }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        info!("Updated pdflink/doclink on post {}", post_id);
        Ok(())
    }
}
