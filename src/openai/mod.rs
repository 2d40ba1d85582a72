//! OpenAI chat/vision access
//!
//! `ChatProvider` is the seam the analysis layer depends on; `OpenAiClient`
//! is the production implementation.

pub mod client;
pub mod options;
pub mod prompts;
pub mod provider;
pub mod types;

pub use client::OpenAiClient;
pub use options::ChatOptions;
pub use provider::ChatProvider;
pub use types::{ChatMessage, ContentPart, MessageContent, Role};
