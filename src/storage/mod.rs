//! Customer image storage
//!
//! Uploaded images are stored under their session id. Three backends exist,
//! chosen by configuration: Google Cloud Storage, a local directory, or
//! process memory.

pub mod gcs;
pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::ServiceError;

pub use gcs::GcsImageStore;
pub use local::LocalImageStore;
pub use memory::MemoryImageStore;

/// Raw image bytes with their MIME type
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl StoredImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Encode as a `data:` URL, accepted by the OpenAI vision endpoint
    pub fn to_data_url(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine};
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }
}

/// Backend-agnostic image store keyed by session id
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image and return the URL the frontend should display
    async fn put(&self, session_id: &str, image: &StoredImage) -> Result<String, ServiceError>;

    /// Load a stored image, `Ok(None)` when absent
    async fn get(&self, session_id: &str) -> Result<Option<StoredImage>, ServiceError>;

    /// Remove a session's image; deleting a missing image is not an error
    async fn delete(&self, session_id: &str) -> Result<(), ServiceError>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// File extension for an image MIME type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/heic" => "heic",
        "image/heif" => "heif",
        _ => "bin",
    }
}

/// Whether an upload's declared type is an image we accept
pub fn is_supported_image(content_type: &str) -> bool {
    extension_for(content_type) != "bin"
}

/// URL at which this process serves a session's image (`GET /image/:id`)
pub fn served_image_url(public_base_url: &str, session_id: &str) -> String {
    format!("{}/image/{}", public_base_url.trim_end_matches('/'), session_id)
}
