//! Ingestion façade
//!
//! Composes the remote clients into the operations the HTTP surface exposes.
//! The service holds no state of its own besides the shared token cache; it
//! is cheap to clone and every clone talks to the same cache.
//!
//! `upload_and_translate` never polls. Callers observe completion by calling
//! `get_status` with the returned urn until it reports a terminal state.

use modelbridge_common::{ModelEntry, Scope, TranslationStatus, Urn};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::aps::{
    derivative::root_filename_for, http_client, Endpoints, ObjectStore, StatusResolver, TokenCache,
    TranslationSubmitter,
};
use crate::config::ApsConfig;
use crate::error::IngestError;

/// Read-only token for the viewer: `{access_token, expires_in}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerToken {
    pub access_token: String,
    /// Whole seconds until the token expires
    pub expires_in: i64,
}

/// Stateless coordinator over the remote conversion platform
#[derive(Clone)]
pub struct IngestService {
    tokens: Arc<TokenCache>,
    store: Arc<ObjectStore>,
    submitter: Arc<TranslationSubmitter>,
    resolver: Arc<StatusResolver>,
}

impl IngestService {
    pub fn new(config: &ApsConfig) -> anyhow::Result<Self> {
        let http = http_client(config)?;
        let endpoints = Endpoints::new(&config.base_url)?;
        let bucket = config.bucket_name();

        info!(bucket = %bucket, base_url = %config.base_url, "Ingestion service configured");

        Ok(Self {
            tokens: Arc::new(TokenCache::new(http.clone(), endpoints.clone(), config)),
            store: Arc::new(ObjectStore::new(http.clone(), endpoints.clone(), bucket)),
            submitter: Arc::new(TranslationSubmitter::new(
                http.clone(),
                endpoints.clone(),
                config.region.clone(),
            )),
            resolver: Arc::new(StatusResolver::new(http, endpoints)),
        })
    }

    /// Every uploaded model with its urn
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelEntry>, IngestError> {
        let credential = self.tokens.get_credential(Scope::Internal).await?;
        let objects = self.store.list_objects(&credential).await?;

        Ok(objects.into_iter().map(ModelEntry::from).collect())
    }

    /// Upload a design file and start translating it.
    ///
    /// Archives without an entrypoint are refused before any network call.
    /// The translation is only submitted once the upload has returned an
    /// object id, with a credential checked again after the transfer.
    #[instrument(skip(self, content))]
    pub async fn upload_and_translate<B>(
        &self,
        name: &str,
        content: B,
        entrypoint: Option<&str>,
    ) -> Result<ModelEntry, IngestError>
    where
        B: Into<Body>,
    {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyName);
        }
        let root_filename = root_filename_for(name, entrypoint)?;

        let credential = self.tokens.get_credential(Scope::Internal).await?;
        let object = self.store.upload(&credential, name, content).await?;

        // The upload may outlive the credential it started with
        let credential = self.tokens.get_credential(Scope::Internal).await?;
        let job = self
            .submitter
            .submit(&credential, &object.object_id, root_filename.as_deref())
            .await?;

        Ok(ModelEntry {
            name: object.key,
            urn: job.urn,
        })
    }

    /// Current translation status; an unknown urn yields the not-found state
    #[instrument(skip(self, urn), fields(urn = %urn))]
    pub async fn get_status(&self, urn: &Urn) -> Result<TranslationStatus, IngestError> {
        let credential = self.tokens.get_credential(Scope::Internal).await?;
        Ok(self.resolver.get_status(&credential, urn).await?)
    }

    /// Public-scope token for the viewer. Internal credentials never leave the server.
    #[instrument(skip(self))]
    pub async fn issue_public_token(&self) -> Result<ViewerToken, IngestError> {
        let credential = self.tokens.get_credential(Scope::Public).await?;

        Ok(ViewerToken {
            access_token: credential.access_token().to_string(),
            expires_in: credential.seconds_to_live(chrono::Utc::now()),
        })
    }
}
