//! Screening steps backed by a chat model

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ServiceError;
use crate::models::ItemType;
use crate::openai::{prompts, ChatProvider};

/// Result of the enhance step
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedAnalysis {
    pub enhanced_analysis: String,
    pub offer_text: String,
}

/// Runs classification, analysis and enhancement against a `ChatProvider`
#[derive(Clone)]
pub struct Analyst {
    provider: Arc<dyn ChatProvider>,
}

impl Analyst {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Classify the image as Art or Antique
    ///
    /// `image_url` may be an `https://` or a `data:` URL. Anything the model
    /// answers other than the two labels is an error.
    pub async fn classify(&self, image_url: &str) -> Result<ItemType, ServiceError> {
        let (messages, options) = prompts::classification(image_url);
        let answer = self.provider.complete(&messages, &options).await?;

        answer.parse::<ItemType>().map_err(|reason| {
            warn!("Unexpected classification from {}: {}", self.provider.model(), reason);
            ServiceError::InvalidResponse("Invalid classification response".to_string())
        })
    }

    /// Write the screening analysis from the customer's image and similar images
    pub async fn analyze(
        &self,
        customer_image_url: &str,
        similar_image_urls: &[String],
        item_type: ItemType,
    ) -> Result<String, ServiceError> {
        let (messages, options) = prompts::analysis(customer_image_url, similar_image_urls, item_type);
        let analysis = self.provider.complete(&messages, &options).await?;
        info!("Generated {} analysis ({} chars)", item_type, analysis.len());
        Ok(analysis)
    }

    /// Produce the enhanced analysis and the offer text concurrently
    pub async fn enhance(&self, analysis_text: &str) -> Result<EnhancedAnalysis, ServiceError> {
        let (enhance_messages, enhance_options) = prompts::enhancement(analysis_text);
        let (offer_messages, offer_options) = prompts::offer(analysis_text);

        let (enhanced_analysis, offer_text) = futures::try_join!(
            self.provider.complete(&enhance_messages, &enhance_options),
            self.provider.complete(&offer_messages, &offer_options),
        )?;

        Ok(EnhancedAnalysis {
            enhanced_analysis,
            offer_text,
        })
    }
}
