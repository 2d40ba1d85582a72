//! Provider trait for chat completion backends

use async_trait::async_trait;

use super::{options::ChatOptions, types::ChatMessage};
use crate::error::ServiceError;

/// Interface the analysis layer uses to talk to a chat model
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a non-streaming completion and return the first choice's text
    ///
    /// # Arguments
    /// * `messages` - Conversation, optionally with image parts
    /// * `options` - Token limit and sampling parameters
    async fn complete(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<String, ServiceError>;

    /// Model identifier, for logs
    fn model(&self) -> &str;
}
