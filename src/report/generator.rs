//! Appraisal report pipeline: WordPress post -> Google Doc -> PDF

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use super::editor::DocumentEditor;
use super::metadata::{self, ImageRef, IMAGE_FIELDS};
use super::probe::ImageProbe;
use crate::error::ServiceError;
use crate::google::drive::DriveService;
use crate::wordpress::{PostData, PostRepository};

/// Metadata key rendered as bold `key: value` lines
const TABLE_KEY: &str = "table";

/// Links returned to the caller and written back to the post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLinks {
    pub pdf_link: String,
    pub doc_link: String,
}

/// Everything read from WordPress before the document is touched
#[derive(Debug, Clone)]
struct ReportSource {
    post: PostData,
    /// `(placeholder key, url)` for the named image fields that resolved
    images: Vec<(&'static str, String)>,
    gallery: Vec<String>,
}

pub struct ReportGenerator {
    posts: Arc<dyn PostRepository>,
    drive: Arc<dyn DriveService>,
    probe: Arc<dyn ImageProbe>,
    editor: DocumentEditor,
    template_id: Option<String>,
    folder_id: Option<String>,
}

impl ReportGenerator {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        drive: Arc<dyn DriveService>,
        probe: Arc<dyn ImageProbe>,
        editor: DocumentEditor,
        template_id: Option<String>,
        folder_id: Option<String>,
    ) -> Self {
        Self {
            posts,
            drive,
            probe,
            editor,
            template_id,
            folder_id,
        }
    }

    /// Build the report for `post_id` and store its links on the post
    pub async fn generate(&self, post_id: &str, session_id: Option<&str>) -> Result<ReportLinks, ServiceError> {
        let (Some(template_id), Some(folder_id)) = (self.template_id.as_deref(), self.folder_id.as_deref()) else {
            return Err(ServiceError::ConfigError(
                "GOOGLE_DOCS_TEMPLATE_ID and GOOGLE_DRIVE_FOLDER_ID must be set".to_string(),
            ));
        };

        let source = self.load_source(post_id).await?;
        let mut values = metadata::template_values(&source.post);
        // `{{table}}` is filled by the formatted insertion below
        let table = values
            .remove(TABLE_KEY)
            .filter(|table| !table.trim().is_empty());
        if table.is_none() {
            values.insert(TABLE_KEY.to_string(), String::new());
        }
        let title = values.get("appraisal_title").cloned().unwrap_or_default();
        info!(
            "Post {}: '{}', {} image field(s), {} gallery image(s)",
            post_id,
            title,
            source.images.len(),
            source.gallery.len()
        );

        let copy = self
            .drive
            .copy_file(template_id, &format!("Appraisal_Report_{}", Uuid::new_v4()))
            .await?;
        let document_id = copy.id.as_str();
        let doc_link = copy
            .web_view_link
            .clone()
            .unwrap_or_else(|| format!("https://docs.google.com/document/d/{}/edit", document_id));
        self.drive.move_to_folder(document_id, folder_id).await?;

        self.editor.replace_placeholders(document_id, &values).await?;
        self.editor.adjust_title_font_size(document_id, &title).await?;

        if let Some(table) = &table {
            self.editor
                .insert_formatted_metadata(document_id, TABLE_KEY, table)
                .await?;
        }

        if !source.gallery.is_empty() {
            self.editor.add_gallery(document_id, source.gallery.len()).await?;
            let skipped = self
                .editor
                .replace_gallery_placeholders(document_id, &source.gallery, self.probe.as_ref())
                .await;
            if !skipped.is_empty() {
                warn!("{} gallery image(s) were not inserted", skipped.len());
            }
        }

        for (key, url) in &source.images {
            self.editor
                .insert_image_at_all_placeholders(document_id, key, url)
                .await;
        }

        let pdf = self.drive.export_pdf(document_id).await?;
        let filename = pdf_filename(post_id, session_id);
        let uploaded = self.drive.upload_pdf(&filename, folder_id, pdf).await?;
        let pdf_link = uploaded
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", uploaded.id));

        self.posts.update_links(post_id, &pdf_link, &doc_link).await?;
        info!("Report for post {} ready: {}", post_id, pdf_link);

        Ok(ReportLinks { pdf_link, doc_link })
    }

    /// Fetch the post, then resolve image fields and gallery media concurrently
    async fn load_source(&self, post_id: &str) -> Result<ReportSource, ServiceError> {
        let post = self.posts.fetch_post(post_id).await?;

        let images = join_all(IMAGE_FIELDS.iter().map(|&(field, key)| {
            let image = metadata::image_ref(&post, field);
            async move { self.resolve_image(image).await.map(|url| (key, url)) }
        }));
        let gallery = join_all(
            metadata::gallery_media_ids(&post)
                .into_iter()
                .map(|id| self.resolve_image(Some(ImageRef::MediaId(id)))),
        );
        let (images, gallery) = futures::join!(images, gallery);

        Ok(ReportSource {
            images: images.into_iter().flatten().collect(),
            gallery: gallery.into_iter().flatten().collect(),
            post,
        })
    }

    /// URL for an image reference; failed media lookups resolve to `None`
    async fn resolve_image(&self, image: Option<ImageRef>) -> Option<String> {
        match image? {
            ImageRef::Url(url) => Some(url),
            ImageRef::MediaId(id) => match self.posts.media_url(id).await {
                Ok(url) => url,
                Err(e) => {
                    warn!("Media {} lookup failed: {}", id, e);
                    None
                }
            },
        }
    }
}

/// `{session}.pdf` when a session id is given, otherwise a unique name for the post
pub fn pdf_filename(post_id: &str, session_id: Option<&str>) -> String {
    match session_id.map(str::trim).filter(|s| !s.is_empty()) {
        Some(session_id) => format!("{}.pdf", session_id),
        None => format!("Appraisal_Report_Post_{}_{}.pdf", post_id, Uuid::new_v4()),
    }
}
