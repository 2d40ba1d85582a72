//! OpenAI chat completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::options::ChatOptions;
use super::provider::ChatProvider;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope};
use crate::config::OpenAiConfig;
use crate::error::ServiceError;

/// Client for the `/chat/completions` endpoint
pub struct OpenAiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Bearer API key
    api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`
    base_url: String,
    /// Model to use
    model: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig, api_key: String) -> Result<Self, ServiceError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ServiceError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_client(http_client, config, api_key))
    }

    /// Create a client sharing an existing HTTP client
    pub fn with_client(http_client: Client, config: &OpenAiConfig, api_key: String) -> Self {
        Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Build the endpoint URL
    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<String, ServiceError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            options,
        };
        let images: usize = messages.iter().map(ChatMessage::image_count).sum();
        debug!("OpenAI request: model={}, messages={}, images={}", self.model, messages.len(), images);

        let response = self
            .http_client
            .post(self.build_endpoint_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        // Check status
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), body));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            info!(
                "OpenAI completion: {} prompt tokens, {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        extract_text(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Prefer the structured error object, fall back to the raw body
fn error_from_body(status: u16, body: String) -> ServiceError {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => ServiceError::ProviderError {
            code: envelope.error.short_code(),
            message: envelope.error.message,
        },
        Err(_) => ServiceError::HttpError { status, body },
    }
}

fn extract_text(completion: ChatCompletionResponse) -> Result<String, ServiceError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::InvalidResponse("OpenAI returned no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(ServiceError::ProviderError {
            code: "refusal".to_string(),
            message: refusal,
        });
    }

    choice
        .message
        .content
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ServiceError::InvalidResponse("OpenAI returned an empty message".to_string()))
}
