//! Service configuration loaded from the environment

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// A variable required by the selected options is absent
    #[error("Missing required variable {0}")]
    Missing(String),
}

/// Deployment environment; development exposes error details in responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" | "staging" | "test" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Where uploaded customer images are kept
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// Google Cloud Storage bucket
    Gcs { bucket: String },
    /// Files under a local directory
    Local { dir: PathBuf },
    /// Process memory only
    Memory,
}

/// Where secrets (API keys, credentials) are read from
#[derive(Debug, Clone, PartialEq)]
pub enum SecretSourceConfig {
    /// Plain environment variables
    Env,
    /// Google Secret Manager, latest version of each secret
    SecretManager { project_id: String },
}

/// OpenAI chat/vision settings
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
}

/// Settings for the report (`/generate-pdf`) pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub template_id: Option<String>,
    pub folder_id: Option<String>,
    pub wordpress_api_url: Option<String>,
    /// Pause between structural document edits so Docs applies them
    pub settle_delay: Duration,
}

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    /// Base URL used to build links to images served by this process
    pub public_base_url: String,
    pub storage: StorageConfig,
    pub max_upload_bytes: u64,
    pub session_ttl: Duration,
    pub secret_source: SecretSourceConfig,
    pub openai: OpenAiConfig,
    pub vision_max_results: u32,
    pub report: ReportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            environment: Environment::Production,
            public_base_url: "http://localhost:8080".to_string(),
            storage: StorageConfig::Local {
                dir: PathBuf::from("uploads"),
            },
            max_upload_bytes: 10 * 1024 * 1024,
            session_ttl: Duration::from_secs(3600),
            secret_source: SecretSourceConfig::Env,
            openai: OpenAiConfig {
                model: "gpt-4o".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
            },
            vision_max_results: 10,
            report: ReportConfig {
                template_id: None,
                folder_id: None,
                wordpress_api_url: None,
                settle_delay: Duration::from_millis(1000),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a map, mainly for tests
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = parse_or(&get, "HOST", defaults.host)?;
        let port = parse_or(&get, "PORT", defaults.port)?;

        let environment = match get("APP_ENV").or_else(|| get("NODE_ENV")) {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                reason,
            })?,
            None => defaults.environment,
        };

        let public_base_url = get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let storage = match get("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "gcs" => StorageConfig::Gcs {
                bucket: get("GCS_BUCKET_NAME")
                    .ok_or_else(|| ConfigError::Missing("GCS_BUCKET_NAME".to_string()))?,
            },
            "local" => StorageConfig::Local {
                dir: get("LOCAL_STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("uploads")),
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "STORAGE_BACKEND".to_string(),
                    reason: format!("expected gcs, local or memory, got '{}'", other),
                })
            }
        };

        let secret_source = match get("SECRET_SOURCE").as_deref().unwrap_or("env") {
            "env" => SecretSourceConfig::Env,
            "secret-manager" | "secret_manager" => SecretSourceConfig::SecretManager {
                project_id: get("GCP_PROJECT_ID")
                    .ok_or_else(|| ConfigError::Missing("GCP_PROJECT_ID".to_string()))?,
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "SECRET_SOURCE".to_string(),
                    reason: format!("expected env or secret-manager, got '{}'", other),
                })
            }
        };

        let session_ttl_secs: u64 = parse_or(&get, "SESSION_TTL_SECS", defaults.session_ttl.as_secs())?;
        let settle_delay_ms: u64 = parse_or(
            &get,
            "DOC_SETTLE_DELAY_MS",
            defaults.report.settle_delay.as_millis() as u64,
        )?;

        Ok(Self {
            host,
            port,
            environment,
            public_base_url,
            storage,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            session_ttl: Duration::from_secs(session_ttl_secs),
            secret_source,
            openai: OpenAiConfig {
                model: get("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or(defaults.openai.base_url)
                    .trim_end_matches('/')
                    .to_string(),
            },
            vision_max_results: parse_or(&get, "VISION_MAX_RESULTS", defaults.vision_max_results)?,
            report: ReportConfig {
                template_id: get("GOOGLE_DOCS_TEMPLATE_ID"),
                folder_id: get("GOOGLE_DRIVE_FOLDER_ID"),
                wordpress_api_url: get("WORDPRESS_API_URL")
                    .map(|url| url.trim_end_matches('/').to_string()),
                settle_delay: Duration::from_millis(settle_delay_ms),
            },
        })
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether error details are included in failure responses
    pub fn expose_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
