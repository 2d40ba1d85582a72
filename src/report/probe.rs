//! Reachability check for gallery images before inserting them

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// Whether the URL answers with a success status
    async fn is_accessible(&self, url: &str) -> bool;
}

/// Sends a `HEAD` request
pub struct HttpImageProbe {
    http_client: Client,
}

impl HttpImageProbe {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_accessible(&self, url: &str) -> bool {
        match self.http_client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Image {} is not reachable: {}", url, e);
                false
            }
        }
    }
}
