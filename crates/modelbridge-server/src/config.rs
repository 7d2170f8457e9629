//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:5173";

// ============================================================================
// Remote Service Constants
// ============================================================================

/// Default base URL of the identity, bucket and translation APIs.
pub const DEFAULT_APS_BASE_URL: &str = "https://developer.api.autodesk.com";

/// Suffix appended to the lower-cased client id to derive the bucket name.
pub const BUCKET_SUFFIX: &str = "-basic-app";

/// A cached credential is refreshed this many seconds before it expires.
pub const DEFAULT_TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

/// Largest accepted safety margin.
pub const MAX_TOKEN_SAFETY_MARGIN_SECS: i64 = 3600;

/// Transport timeout for every remote call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Region the translation jobs run in.
pub const DEFAULT_APS_REGION: &str = "US";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub aps: ApsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Directory holding the viewer front-end, served at `/` when set
    pub static_dir: Option<PathBuf>,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Credentials and endpoints of the remote conversion platform
#[derive(Clone, Serialize, Deserialize)]
pub struct ApsConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// Explicit bucket name; derived from the client id when unset
    pub bucket: Option<String>,
    pub base_url: String,
    pub region: String,
    pub token_safety_margin_secs: i64,
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for ApsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .field("token_safety_margin_secs", &self.token_safety_margin_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl ApsConfig {
    /// Config for the given client credentials with every other field defaulted
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            bucket: None,
            base_url: DEFAULT_APS_BASE_URL.to_string(),
            region: DEFAULT_APS_REGION.to_string(),
            token_safety_margin_secs: DEFAULT_TOKEN_SAFETY_MARGIN_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    /// Bucket uploads go to: the override if set, otherwise `lower(client_id)` + suffix
    pub fn bucket_name(&self) -> String {
        match self.bucket.as_deref().map(str::trim) {
            Some(bucket) if !bucket.is_empty() => bucket.to_string(),
            _ => format!("{}{}", self.client_id.to_lowercase(), BUCKET_SUFFIX),
        }
    }

    pub fn from_env() -> Self {
        let client_id = std::env::var("APS_CLIENT_ID").unwrap_or_default();
        let client_secret = std::env::var("APS_CLIENT_SECRET").unwrap_or_default();

        Self {
            bucket: std::env::var("APS_BUCKET").ok().filter(|b| !b.trim().is_empty()),
            base_url: std::env::var("APS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_APS_BASE_URL.to_string()),
            region: std::env::var("APS_REGION").unwrap_or_else(|_| DEFAULT_APS_REGION.to_string()),
            token_safety_margin_secs: env_parse("APS_TOKEN_SAFETY_MARGIN_SECS")
                .unwrap_or(DEFAULT_TOKEN_SAFETY_MARGIN_SECS),
            http_timeout_secs: env_parse("APS_HTTP_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ..Self::new(client_id, client_secret)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            anyhow::bail!("Missing required environment variables APS_CLIENT_ID or APS_CLIENT_SECRET");
        }

        if !(0..=MAX_TOKEN_SAFETY_MARGIN_SECS).contains(&self.token_safety_margin_secs) {
            anyhow::bail!(
                "APS token safety margin must be between 0 and {} seconds",
                MAX_TOKEN_SAFETY_MARGIN_SECS
            );
        }

        if self.http_timeout_secs == 0 {
            anyhow::bail!("APS HTTP timeout must be greater than 0");
        }

        reqwest::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid APS base URL '{}': {}", self.base_url, e))?;

        Ok(())
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("MODELBRIDGE_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_parse("MODELBRIDGE_PORT").unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_parse("MODELBRIDGE_SHUTDOWN_TIMEOUT")
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
                static_dir: std::env::var("MODELBRIDGE_STATIC_DIR").ok().map(PathBuf::from),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_parse("CORS_ALLOW_CREDENTIALS").unwrap_or(false),
            },
            aps: ApsConfig::from_env(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if let Some(dir) = &self.server.static_dir {
            if !dir.is_dir() {
                anyhow::bail!("Static directory '{}' does not exist", dir.display());
            }
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        self.aps.validate()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
