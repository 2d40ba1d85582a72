//! WordPress appraisal posts (REST API + ACF)

pub mod client;
pub mod types;

pub use client::{missing_post, PostRepository, WordPressClient};
pub use types::PostData;
