//! Clients for the remote conversion platform
//!
//! Four collaborators live here, leaves first:
//!
//! - [`TokenCache`]: client-credential tokens, cached per [`Scope`](modelbridge_common::Scope)
//! - [`ObjectStore`]: bucket put/list
//! - [`TranslationSubmitter`]: starts conversion jobs
//! - [`StatusResolver`]: reads job manifests into a normalized status
//!
//! None of them retries. Every remote failure is returned to the caller with
//! the service's response body intact.

pub mod auth;
pub mod derivative;
pub mod oss;

pub use auth::{Credential, TokenCache};
pub use derivative::{OutputFormat, StatusResolver, TranslationJob, TranslationSubmitter};
pub use oss::ObjectStore;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApsConfig;
use crate::error::RemoteError;

/// Builds every remote URL from one configurable base
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid APS base URL '{}': {}", base_url, e))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("APS base URL '{}' cannot carry a path", base_url);
        }
        Ok(Self { base })
    }

    /// Append percent-encoded path segments to the base URL
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn token(&self) -> Url {
        self.url(&["authentication", "v2", "token"])
    }

    pub fn buckets(&self) -> Url {
        self.url(&["oss", "v2", "buckets"])
    }

    pub fn bucket_details(&self, bucket: &str) -> Url {
        self.url(&["oss", "v2", "buckets", bucket, "details"])
    }

    pub fn objects(&self, bucket: &str) -> Url {
        self.url(&["oss", "v2", "buckets", bucket, "objects"])
    }

    pub fn signed_upload(&self, bucket: &str, key: &str) -> Url {
        self.url(&["oss", "v2", "buckets", bucket, "objects", key, "signeds3upload"])
    }

    pub fn translation_job(&self) -> Url {
        self.url(&["modelderivative", "v2", "designdata", "job"])
    }

    pub fn manifest(&self, urn: &str) -> Url {
        self.url(&["modelderivative", "v2", "designdata", urn, "manifest"])
    }
}

/// Shared HTTP client; the transport timeout is the only timeout in the pipeline
pub fn http_client(config: &ApsConfig) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("modelbridge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

/// Pass through 2xx responses, turn anything else into [`RemoteError::Rejected`]
pub(crate) async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let bytes = ensure_success(response).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}
