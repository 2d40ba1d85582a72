//! Sequential edits on a copied report document
//!
//! Each step fetches the current document, plans requests with
//! `google::docs::template`, and sends them. Structural steps (gallery)
//! wait between edits so later reads see the applied changes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::probe::ImageProbe;
use crate::error::ServiceError;
use crate::google::docs::{template, DocumentService, Request};

pub struct DocumentEditor {
    docs: Arc<dyn DocumentService>,
    settle_delay: Duration,
}

impl DocumentEditor {
    pub fn new(docs: Arc<dyn DocumentService>, settle_delay: Duration) -> Self {
        Self { docs, settle_delay }
    }

    async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn send(&self, document_id: &str, requests: &[Request]) -> Result<(), ServiceError> {
        if requests.is_empty() {
            return Ok(());
        }
        self.docs.batch_update(document_id, requests).await
    }

    /// Fill every `{{key}}` present in the document with its value
    pub async fn replace_placeholders(
        &self,
        document_id: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<(), ServiceError> {
        let document = self.docs.get_document(document_id).await?;
        let requests = template::replacement_requests(&document, values);
        if requests.is_empty() {
            warn!("No placeholders found in document {}", document_id);
            return Ok(());
        }

        self.send(document_id, &requests).await?;
        info!("Replaced {} placeholder(s) in {}", requests.len(), document_id);
        Ok(())
    }

    /// Size the title run according to the title length
    pub async fn adjust_title_font_size(&self, document_id: &str, title: &str) -> Result<(), ServiceError> {
        let document = self.docs.get_document(document_id).await?;
        let Some(request) = template::title_font_request(&document, title) else {
            warn!("Title '{}' not found in document {}, font size unchanged", title, document_id);
            return Ok(());
        };

        self.send(document_id, &[request]).await?;
        info!("Title font size set to {}pt", template::title_font_size(title));
        Ok(())
    }

    /// Replace `{{key}}` with `key: value` lines parsed from `raw`
    pub async fn insert_formatted_metadata(&self, document_id: &str, key: &str, raw: &str) -> Result<(), ServiceError> {
        let document = self.docs.get_document(document_id).await?;
        let Some(at) = template::find_first_placeholder(&document, key) else {
            warn!("Placeholder {} not found in document {}", template::placeholder(key), document_id);
            return Ok(());
        };

        let formatted = template::format_metadata(raw);
        debug!("Formatted {}:\n{}", key, formatted.text);
        self.send(document_id, &template::metadata_requests(at, &formatted)).await?;
        info!("Inserted {} formatted row(s) for {}", formatted.text.lines().count(), key);
        Ok(())
    }

    /// Replace `{{gallery}}` with a table holding one placeholder per image
    pub async fn add_gallery(&self, document_id: &str, images: usize) -> Result<(), ServiceError> {
        let document = self.docs.get_document(document_id).await?;
        let Some(at) = template::find_first_placeholder(&document, "gallery") else {
            warn!("Placeholder {{{{gallery}}}} not found in document {}", document_id);
            return Ok(());
        };

        self.send(document_id, &[Request::delete_range(at)]).await?;
        self.settle(self.settle_delay / 2).await;

        let rows = template::gallery_rows(images);
        info!("Inserting {}x{} gallery table", rows, template::GALLERY_COLUMNS);
        self.send(
            document_id,
            &[Request::insert_table(rows, template::GALLERY_COLUMNS, at.start_index)],
        )
        .await?;
        self.settle(self.settle_delay).await;

        let document = self.docs.get_document(document_id).await?;
        let Some(table) = template::find_first_table_at_or_after(&document.body.content, at.start_index) else {
            warn!("Gallery table not found after index {}", at.start_index);
            return Ok(());
        };

        let requests = template::gallery_placeholder_requests(table, images);
        self.send(document_id, &requests).await?;
        self.settle(self.settle_delay).await;
        info!("Inserted {} gallery placeholder(s)", requests.len());
        Ok(())
    }

    /// Put the image at every `{{key}}`; returns how many were replaced
    pub async fn try_insert_image_at_all_placeholders(
        &self,
        document_id: &str,
        key: &str,
        image_url: &str,
    ) -> Result<usize, ServiceError> {
        let document = self.docs.get_document(document_id).await?;
        let occurrences = template::find_placeholder_occurrences(&document, key);
        if occurrences.is_empty() {
            warn!("No occurrences of {} found", template::placeholder(key));
            return Ok(0);
        }

        self.send(document_id, &template::image_requests(&occurrences, image_url))
            .await?;
        Ok(occurrences.len())
    }

    /// Like `try_insert_image_at_all_placeholders`, logging failures instead of returning them
    pub async fn insert_image_at_all_placeholders(&self, document_id: &str, key: &str, image_url: &str) {
        match self
            .try_insert_image_at_all_placeholders(document_id, key, image_url)
            .await
        {
            Ok(0) => {}
            Ok(n) => info!("Replaced {} occurrence(s) of {} with an image", n, template::placeholder(key)),
            Err(e) => warn!("Could not insert image for {}: {}", template::placeholder(key), e),
        }
    }

    /// Swap gallery placeholders for images, blanking the ones that fail
    ///
    /// Returns the keys of placeholders that were not replaced.
    pub async fn replace_gallery_placeholders(
        &self,
        document_id: &str,
        gallery: &[String],
        probe: &dyn ImageProbe,
    ) -> Vec<String> {
        let mut unreplaced = Vec::new();

        for (i, image_url) in gallery.iter().enumerate() {
            let key = template::gallery_placeholder_key(i + 1);
            if !probe.is_accessible(image_url).await {
                warn!("Image {} is not accessible, skipping {}", image_url, template::placeholder(&key));
                unreplaced.push(key);
                continue;
            }
            match self
                .try_insert_image_at_all_placeholders(document_id, &key, image_url)
                .await
            {
                Ok(n) if n > 0 => {}
                Ok(_) => unreplaced.push(key),
                Err(e) => {
                    warn!("Error inserting gallery image for {}: {}", template::placeholder(&key), e);
                    unreplaced.push(key);
                }
            }
        }

        if !unreplaced.is_empty() {
            self.remove_placeholders(document_id, &unreplaced).await;
        }
        unreplaced
    }

    /// Blank out the given placeholders; failures are logged
    pub async fn remove_placeholders(&self, document_id: &str, keys: &[String]) {
        let result = async {
            let document = self.docs.get_document(document_id).await?;
            let requests = template::removal_requests(&document, keys);
            self.send(document_id, &requests).await?;
            Ok::<usize, ServiceError>(requests.len())
        }
        .await;

        match result {
            Ok(0) => debug!("No leftover placeholders to remove"),
            Ok(n) => info!("Removed {} leftover placeholder(s)", n),
            Err(e) => warn!("Error removing leftover placeholders: {}", e),
        }
    }
}
