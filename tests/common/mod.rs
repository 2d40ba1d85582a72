#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use art_screener::analysis::Analyst;
use art_screener::config::{AppConfig, Environment, StorageConfig};
use art_screener::error::ServiceError;
use art_screener::google::docs::types::{
    Body, Paragraph, ParagraphElement, StructuralElement, Table, TableCell, TableRow, TextRun,
};
use art_screener::google::docs::{Document, DocumentService, Request};
use art_screener::google::vision::{WebDetection, WebDetector, WebImage};
use art_screener::google::{DriveFile, DriveService};
use art_screener::openai::types::MessageContent;
use art_screener::openai::{prompts, ChatMessage, ChatOptions, ChatProvider};
use art_screener::report::{DocumentEditor, ImageProbe, ReportGenerator};
use art_screener::state::AppState;
use art_screener::storage::MemoryImageStore;
use art_screener::wordpress::{missing_post, PostData, PostRepository};

pub const BASE_URL: &str = "http://localhost:8080";

// Vision

pub struct FakeVision {
    pub similar: Vec<String>,
    pub fail: bool,
    pub calls: Mutex<usize>,
}

impl FakeVision {
    pub fn with_similar(similar: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            similar: similar.iter().map(|s| s.to_string()).collect(),
            fail: false,
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl WebDetector for FakeVision {
    async fn detect(&self, _image: &[u8]) -> Result<WebDetection, ServiceError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(ServiceError::HttpError {
                status: 503,
                body: "vision unavailable".to_string(),
            });
        }
        Ok(WebDetection {
            visually_similar_images: self
                .similar
                .iter()
                .map(|url| WebImage { url: url.clone() })
                .collect(),
            ..WebDetection::default()
        })
    }
}

// Chat

/// Answers each prompt kind with a fixed reply
pub struct FakeChat {
    pub classification: String,
    pub fail_enhance: bool,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChat {
    pub fn classifying_as(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            classification: answer.to_string(),
            fail_enhance: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn image_counts(&self) -> Vec<usize> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|messages| messages.iter().map(ChatMessage::image_count).sum())
            .collect()
    }
}

#[async_trait]
impl ChatProvider for FakeChat {
    async fn complete(&self, messages: &[ChatMessage], _options: &ChatOptions) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let system = match messages.first().map(|m| &m.content) {
            Some(MessageContent::Text(text)) => text.as_str(),
            _ => "",
        };

        if system == prompts::CLASSIFY_SYSTEM {
            Ok(self.classification.clone())
        } else if system == prompts::ANALYSIS_SYSTEM {
            Ok("A 19th century oil portrait.".to_string())
        } else if system == prompts::ENHANCE_SYSTEM {
            if self.fail_enhance {
                return Err(ServiceError::ProviderError {
                    code: "server_error".to_string(),
                    message: "The server had an error".to_string(),
                });
            }
            Ok("Enhanced: a 19th century oil portrait.".to_string())
        } else if system == prompts::OFFER_SYSTEM {
            Ok("Order a full appraisal today.".to_string())
        } else {
            Err(ServiceError::InvalidResponse("unexpected prompt".to_string()))
        }
    }

    fn model(&self) -> &str {
        "fake-chat"
    }
}

// Docs

/// In-memory document; swaps to `after_table` once a table is inserted
pub struct FakeDocs {
    pub current: Mutex<Document>,
    pub after_table: Mutex<Option<Document>>,
    pub batches: Mutex<Vec<Vec<Request>>>,
    pub fail_images: bool,
}

impl FakeDocs {
    pub fn new(document: Document) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(document),
            after_table: Mutex::new(None),
            batches: Mutex::new(Vec::new()),
            fail_images: false,
        })
    }

    pub fn with_table_document(document: Document, after_table: Document) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(document),
            after_table: Mutex::new(Some(after_table)),
            batches: Mutex::new(Vec::new()),
            fail_images: false,
        })
    }

    pub fn all_requests(&self) -> Vec<Request> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl DocumentService for FakeDocs {
    async fn get_document(&self, _document_id: &str) -> Result<Document, ServiceError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn batch_update(&self, _document_id: &str, requests: &[Request]) -> Result<(), ServiceError> {
        if self.fail_images
            && requests
                .iter()
                .any(|r| matches!(r, Request::InsertInlineImage { .. }))
        {
            return Err(ServiceError::HttpError {
                status: 400,
                body: "Invalid requests[1].insertInlineImage".to_string(),
            });
        }
        if requests.iter().any(|r| matches!(r, Request::InsertTable { .. })) {
            if let Some(next) = self.after_table.lock().unwrap().take() {
                *self.current.lock().unwrap() = next;
            }
        }
        self.batches.lock().unwrap().push(requests.to_vec());
        Ok(())
    }
}

// Drive

#[derive(Default)]
pub struct FakeDrive {
    pub copies: Mutex<Vec<(String, String)>>,
    pub moves: Mutex<Vec<(String, String)>>,
    pub uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
}

#[async_trait]
impl DriveService for FakeDrive {
    async fn copy_file(&self, file_id: &str, name: &str) -> Result<DriveFile, ServiceError> {
        self.copies
            .lock()
            .unwrap()
            .push((file_id.to_string(), name.to_string()));
        Ok(DriveFile {
            id: "doc-copy".to_string(),
            web_view_link: Some("https://docs.google.com/document/d/doc-copy/edit".to_string()),
            parents: vec!["root".to_string()],
        })
    }

    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<(), ServiceError> {
        self.moves
            .lock()
            .unwrap()
            .push((file_id.to_string(), folder_id.to_string()));
        Ok(())
    }

    async fn export_pdf(&self, _file_id: &str) -> Result<Vec<u8>, ServiceError> {
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    async fn upload_pdf(&self, name: &str, folder_id: &str, pdf: Vec<u8>) -> Result<DriveFile, ServiceError> {
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), folder_id.to_string(), pdf));
        Ok(DriveFile {
            id: "pdf-1".to_string(),
            web_view_link: Some("https://drive.google.com/file/d/pdf-1/view".to_string()),
            parents: vec![folder_id.to_string()],
        })
    }
}

// WordPress

pub struct FakePosts {
    pub post: PostData,
    pub media: HashMap<u64, String>,
    pub updates: Mutex<Vec<(String, String, String)>>,
}

impl FakePosts {
    pub fn new(post: serde_json::Value, media: &[(u64, &str)]) -> Arc<Self> {
        Arc::new(Self {
            post: serde_json::from_value(post).unwrap(),
            media: media.iter().map(|(id, url)| (*id, url.to_string())).collect(),
            updates: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PostRepository for FakePosts {
    async fn fetch_post(&self, post_id: &str) -> Result<PostData, ServiceError> {
        if post_id == "404" {
            return Err(missing_post(post_id));
        }
        Ok(self.post.clone())
    }

    async fn media_url(&self, media_id: u64) -> Result<Option<String>, ServiceError> {
        Ok(self.media.get(&media_id).cloned())
    }

    async fn update_links(&self, post_id: &str, pdf_link: &str, doc_link: &str) -> Result<(), ServiceError> {
        self.updates.lock().unwrap().push((
            post_id.to_string(),
            pdf_link.to_string(),
            doc_link.to_string(),
        ));
        Ok(())
    }
}

// Probe

pub struct FakeProbe {
    pub accessible: HashSet<String>,
}

impl FakeProbe {
    pub fn allowing(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            accessible: urls.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl ImageProbe for FakeProbe {
    async fn is_accessible(&self, url: &str) -> bool {
        self.accessible.contains(url)
    }
}

// Wiring

pub fn test_config(environment: Environment) -> AppConfig {
    AppConfig {
        environment,
        public_base_url: BASE_URL.to_string(),
        storage: StorageConfig::Memory,
        max_upload_bytes: 1024 * 1024,
        session_ttl: Duration::from_secs(600),
        ..AppConfig::default()
    }
}

pub fn report_generator(
    posts: Arc<FakePosts>,
    docs: Arc<FakeDocs>,
    drive: Arc<FakeDrive>,
    probe: Arc<FakeProbe>,
) -> ReportGenerator {
    ReportGenerator::new(
        posts,
        drive,
        probe,
        DocumentEditor::new(docs, Duration::ZERO),
        Some("template-1".to_string()),
        Some("folder-1".to_string()),
    )
}

pub fn test_state(
    environment: Environment,
    vision: Arc<FakeVision>,
    chat: Arc<FakeChat>,
    reports: Option<Arc<ReportGenerator>>,
) -> AppState {
    state_with_images(test_config(environment), vision, chat, reports).0
}

/// State plus a handle on its image store
pub fn state_with_images(
    config: AppConfig,
    vision: Arc<FakeVision>,
    chat: Arc<FakeChat>,
    reports: Option<Arc<ReportGenerator>>,
) -> (AppState, Arc<MemoryImageStore>) {
    let images = Arc::new(MemoryImageStore::new(BASE_URL));
    let state = AppState::new(config, images.clone(), vision, Analyst::new(chat), reports);
    (state, images)
}

// Documents

/// Builds a document body, assigning indexes as the Docs API would
pub struct DocBuilder {
    index: usize,
    content: Vec<StructuralElement>,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self {
            index: 1,
            content: Vec::new(),
        }
    }

    fn paragraph_at(start: usize, text: &str) -> StructuralElement {
        let end = start + text.encode_utf16().count();
        StructuralElement {
            start_index: start,
            end_index: end,
            paragraph: Some(Paragraph {
                elements: vec![ParagraphElement {
                    start_index: start,
                    end_index: end,
                    text_run: Some(TextRun {
                        content: text.to_string(),
                    }),
                }],
            }),
            table: None,
        }
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        let element = Self::paragraph_at(self.index, text);
        self.index = element.end_index;
        self.content.push(element);
        self
    }

    /// Table of `columns` columns whose cells hold the given texts, row-major
    pub fn table(mut self, columns: usize, cells: &[&str]) -> Self {
        let rows = cells.len().div_ceil(columns);
        let start = self.index;
        let mut index = start + 1;
        let mut table_rows = Vec::new();
        for row in cells.chunks(columns) {
            let row_start = index;
            index += 1;
            let mut table_cells = Vec::new();
            for text in row {
                let paragraph = Self::paragraph_at(index + 1, text);
                let end = paragraph.end_index;
                table_cells.push(TableCell {
                    start_index: index,
                    end_index: end,
                    content: vec![paragraph],
                });
                index = end;
            }
            table_rows.push(TableRow {
                start_index: row_start,
                end_index: index,
                table_cells,
            });
        }
        self.content.push(StructuralElement {
            start_index: start,
            end_index: index + 1,
            paragraph: None,
            table: Some(Table {
                rows,
                columns,
                table_rows,
            }),
        });
        self.index = index + 1;
        self
    }

    pub fn build(self) -> Document {
        Document {
            document_id: Some("doc-copy".to_string()),
            title: Some("Appraisal".to_string()),
            body: Body {
                content: self.content,
            },
        }
    }
}
