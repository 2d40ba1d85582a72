//! Shared service state handed to every handler

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use crate::analysis::Analyst;
use crate::config::{AppConfig, SecretSourceConfig, StorageConfig};
use crate::error::ServiceError;
use crate::google::{AuthenticationManager, DocsClient, DriveClient, GoogleVisionClient, WebDetector};
use crate::openai::OpenAiClient;
use crate::report::{DocumentEditor, HttpImageProbe, ReportGenerator};
use crate::secrets::{names, EnvSecrets, SecretManagerSecrets, SecretSource};
use crate::session::SessionStore;
use crate::storage::{GcsImageStore, ImageStore, LocalImageStore, MemoryImageStore};
use crate::wordpress::WordPressClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub images: Arc<dyn ImageStore>,
    pub vision: Arc<dyn WebDetector>,
    pub analyst: Analyst,
    /// `None` when WordPress is not configured
    pub reports: Option<Arc<ReportGenerator>>,
}

impl AppState {
    /// Assemble state from already-built services
    pub fn new(
        config: AppConfig,
        images: Arc<dyn ImageStore>,
        vision: Arc<dyn WebDetector>,
        analyst: Analyst,
        reports: Option<Arc<ReportGenerator>>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl),
            config: Arc::new(config),
            images,
            vision,
            analyst,
            reports,
        }
    }

    /// Build the production clients described by `config`
    ///
    /// # Errors
    ///
    /// Fails when Google credentials cannot be found, a required secret is
    /// missing, or the storage directory cannot be created.
    pub async fn from_config(config: AppConfig) -> Result<Self, ServiceError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ServiceError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        let auth_manager = Arc::new(AuthenticationManager::new().await?);

        let secrets: Box<dyn SecretSource> = match &config.secret_source {
            SecretSourceConfig::Env => Box::new(EnvSecrets),
            SecretSourceConfig::SecretManager { project_id } => Box::new(SecretManagerSecrets::new(
                http_client.clone(),
                auth_manager.clone(),
                project_id.clone(),
            )),
        };

        let images: Arc<dyn ImageStore> = match &config.storage {
            StorageConfig::Gcs { bucket } => Arc::new(GcsImageStore::new(
                http_client.clone(),
                auth_manager.clone(),
                bucket.clone(),
            )),
            StorageConfig::Local { dir } => {
                Arc::new(LocalImageStore::new(dir.clone(), config.public_base_url.clone()).await?)
            }
            StorageConfig::Memory => Arc::new(MemoryImageStore::new(config.public_base_url.clone())),
        };
        info!("Image storage backend: {}", images.backend());

        let vision = Arc::new(GoogleVisionClient::new(
            http_client.clone(),
            auth_manager.clone(),
            config.vision_max_results,
        ));

        let api_key = secrets.require(names::OPENAI_API_KEY).await?;
        let openai = OpenAiClient::new(&config.openai, api_key)?;
        info!("OpenAI model: {}", config.openai.model);
        let analyst = Analyst::new(Arc::new(openai));

        let reports = build_reports(&config, &http_client, &auth_manager, secrets.as_ref()).await?;

        Ok(Self::new(config, images, vision, analyst, reports))
    }

    pub fn expose_errors(&self) -> bool {
        self.config.expose_errors()
    }

    /// Drop expired sessions along with their stored images
    ///
    /// Returns how many sessions were removed. Image deletion failures are
    /// logged and do not stop the sweep.
    pub async fn purge_expired_sessions(&self) -> usize {
        let expired = self.sessions.purge_expired().await;
        for session_id in &expired {
            self.discard_image(session_id).await;
        }
        expired.len()
    }

    /// Delete a session's image, logging failures
    pub async fn discard_image(&self, session_id: &str) {
        if let Err(e) = self.images.delete(session_id).await {
            warn!("Could not delete image for session {}: {}", session_id, e);
        }
    }

    /// Periodically purge expired sessions until the runtime shuts down
    pub fn spawn_session_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            IntervalStream::new(interval(period))
                .for_each(|_tick| {
                    let state = state.clone();
                    async move {
                        let removed = state.purge_expired_sessions().await;
                        if removed > 0 {
                            debug!("Evicted {} expired sessions", removed);
                        }
                    }
                })
                .await;
        })
    }
}

async fn build_reports(
    config: &AppConfig,
    http_client: &Client,
    default_auth: &Arc<AuthenticationManager>,
    secrets: &dyn SecretSource,
) -> Result<Option<Arc<ReportGenerator>>, ServiceError> {
    let Some(api_url) = config.report.wordpress_api_url.as_deref() else {
        warn!("WORDPRESS_API_URL not set, /generate-pdf is disabled");
        return Ok(None);
    };

    let username = secrets.require(names::WORDPRESS_USERNAME).await?;
    let app_password = secrets.require(names::WORDPRESS_APP_PASSWORD).await?;
    let posts = WordPressClient::new(http_client.clone(), api_url, username, app_password);

    let docs_auth = match secrets.get(names::GOOGLE_DOCS_CREDENTIALS).await? {
        Some(json) => Arc::new(AuthenticationManager::from_service_account_json(&json)?),
        None => default_auth.clone(),
    };
    let docs = DocsClient::new(http_client.clone(), docs_auth.clone());
    let drive = DriveClient::new(http_client.clone(), docs_auth);

    Ok(Some(Arc::new(ReportGenerator::new(
        Arc::new(posts),
        Arc::new(drive),
        Arc::new(HttpImageProbe::new(http_client.clone())),
        DocumentEditor::new(Arc::new(docs), config.report.settle_delay),
        config.report.template_id.clone(),
        config.report.folder_id.clone(),
    ))))
}
