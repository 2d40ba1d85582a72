//! Process-memory image store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{served_image_url, ImageStore, StoredImage};
use crate::error::ServiceError;

/// Keeps images in memory; they are lost on restart
pub struct MemoryImageStore {
    images: RwLock<HashMap<String, StoredImage>>,
    public_base_url: String,
}

impl MemoryImageStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            images: RwLock::new(HashMap::new()),
            public_base_url: public_base_url.into(),
        }
    }

    /// Number of images currently held
    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.images.read().await.is_empty()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, session_id: &str, image: &StoredImage) -> Result<String, ServiceError> {
        self.images
            .write()
            .await
            .insert(session_id.to_string(), image.clone());
        Ok(served_image_url(&self.public_base_url, session_id))
    }

    async fn get(&self, session_id: &str) -> Result<Option<StoredImage>, ServiceError> {
        Ok(self.images.read().await.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<(), ServiceError> {
        self.images.write().await.remove(session_id);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
