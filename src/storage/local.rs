//! Local-disk image store

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::{served_image_url, ImageStore, StoredImage};
use crate::error::ServiceError;

/// Sidecar metadata written next to each image file
#[derive(Debug, Serialize, Deserialize)]
struct ImageMeta {
    content_type: String,
}

/// Writes `<dir>/<session>.img` plus `<session>.json` with the MIME type
pub struct LocalImageStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    /// Create the store, making sure the directory exists
    pub async fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn paths(&self, session_id: &str) -> Result<(PathBuf, PathBuf), ServiceError> {
        // Session ids are UUIDs; refuse anything that could escape the directory
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ServiceError::InvalidRequest(format!(
                "Invalid session id '{}'",
                session_id
            )));
        }
        Ok((
            self.dir.join(format!("{}.img", session_id)),
            self.dir.join(format!("{}.json", session_id)),
        ))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, session_id: &str, image: &StoredImage) -> Result<String, ServiceError> {
        let (data_path, meta_path) = self.paths(session_id)?;
        let meta = serde_json::to_vec(&ImageMeta {
            content_type: image.content_type.clone(),
        })?;

        fs::write(&data_path, &image.bytes).await?;
        fs::write(&meta_path, meta).await?;
        debug!("Stored {} bytes at {}", image.bytes.len(), data_path.display());

        Ok(served_image_url(&self.public_base_url, session_id))
    }

    async fn get(&self, session_id: &str) -> Result<Option<StoredImage>, ServiceError> {
        let (data_path, meta_path) = self.paths(session_id)?;

        let bytes = match fs::read(&data_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = match fs::read(&meta_path).await {
            Ok(raw) => serde_json::from_slice::<ImageMeta>(&raw)?.content_type,
            Err(e) if e.kind() == ErrorKind::NotFound => "application/octet-stream".to_string(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(StoredImage::new(bytes, content_type)))
    }

    async fn delete(&self, session_id: &str) -> Result<(), ServiceError> {
        let (data_path, meta_path) = self.paths(session_id)?;
        for path in [data_path, meta_path] {
            match fs::remove_file(&path).await {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
