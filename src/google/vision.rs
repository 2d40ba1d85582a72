//! Google Cloud Vision web detection

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{http_error, ServiceError};
use crate::google::auth::{scopes, AuthenticationManager};

const ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Finds images on the web that look like the customer's
#[async_trait]
pub trait WebDetector: Send + Sync {
    async fn detect(&self, image: &[u8]) -> Result<WebDetection, ServiceError>;
}

// Request types

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    max_results: u32,
}

// Response types

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    web_detection: Option<WebDetection>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Web detection result for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDetection {
    #[serde(default)]
    pub web_entities: Vec<WebEntity>,
    #[serde(default)]
    pub full_matching_images: Vec<WebImage>,
    #[serde(default)]
    pub partial_matching_images: Vec<WebImage>,
    #[serde(default)]
    pub pages_with_matching_images: Vec<WebPage>,
    #[serde(default)]
    pub visually_similar_images: Vec<WebImage>,
    #[serde(default)]
    pub best_guess_labels: Vec<WebLabel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebEntity {
    pub entity_id: Option<String>,
    #[serde(default)]
    pub score: f32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPage {
    pub url: String,
    pub page_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLabel {
    pub label: String,
    pub language_code: Option<String>,
}

impl WebDetection {
    /// Visually similar image URLs, deduplicated, at most `limit`
    pub fn similar_image_urls(&self, limit: usize) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for image in &self.visually_similar_images {
            if urls.len() >= limit {
                break;
            }
            if !image.url.is_empty() && !urls.contains(&image.url) {
                urls.push(image.url.clone());
            }
        }
        urls
    }

    /// Best-guess label, if Vision produced one
    pub fn best_guess(&self) -> Option<&str> {
        self.best_guess_labels.first().map(|l| l.label.as_str())
    }
}

/// Client for the Vision `images:annotate` endpoint
pub struct GoogleVisionClient {
    http_client: Client,
    auth_manager: Arc<AuthenticationManager>,
    max_results: u32,
}

impl GoogleVisionClient {
    pub fn new(http_client: Client, auth_manager: Arc<AuthenticationManager>, max_results: u32) -> Self {
        Self {
            http_client,
            auth_manager,
            max_results,
        }
    }

    fn build_request(&self, image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    feature_type: "WEB_DETECTION".to_string(),
                    max_results: self.max_results,
                }],
            }],
        }
    }
}

#[async_trait]
impl WebDetector for GoogleVisionClient {
    async fn detect(&self, image: &[u8]) -> Result<WebDetection, ServiceError> {
        let token = self.auth_manager.get_token(&[scopes::CLOUD_PLATFORM]).await?;

        let response = self
            .http_client
            .post(ANNOTATE_URL)
            .bearer_auth(token)
            .json(&self.build_request(image))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let body: AnnotateResponse = response.json().await?;
        let detection = parse_first_response(body)?;
        info!(
            "Vision web detection: {} similar, {} full, {} partial matches",
            detection.visually_similar_images.len(),
            detection.full_matching_images.len(),
            detection.partial_matching_images.len()
        );
        debug!("Best guess label: {:?}", detection.best_guess());
        Ok(detection)
    }
}

fn parse_first_response(body: AnnotateResponse) -> Result<WebDetection, ServiceError> {
    let first = body
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::InvalidResponse("Vision returned no responses".to_string()))?;

    if let Some(status) = first.error {
        return Err(ServiceError::ProviderError {
            code: status.code.to_string(),
            message: status.message,
        });
    }

    Ok(first.web_detection.unwrap_or_default())
}
