//! Chat completion parameters

use serde::{Deserialize, Serialize};

/// Sampling settings sent alongside the messages of one completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Reply length cap; classification only needs a single word
    pub max_tokens: u32,
    /// 0.0-2.0; omitted to use the model default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatOptions {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}
