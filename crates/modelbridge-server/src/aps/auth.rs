//! Token cache
//!
//! Holds at most one live [`Credential`] per [`Scope`]. Each scope slot sits
//! behind its own async mutex that stays locked across the identity-provider
//! call, so concurrent callers that find the slot empty or expired wait for
//! the single in-flight refresh instead of issuing their own. The Internal and
//! Public slots never block each other.

use chrono::{DateTime, Duration, Utc};
use modelbridge_common::Scope;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{read_json, Endpoints};
use crate::config::{ApsConfig, MAX_TOKEN_SAFETY_MARGIN_SECS};
use crate::error::{AuthError, RemoteError};

/// Permissions requested for write-capable server-side work
pub const INTERNAL_PERMISSIONS: &str = "bucket:create bucket:read data:read data:create data:write";

/// Permissions requested for tokens handed to the viewer
pub const PUBLIC_PERMISSIONS: &str = "viewables:read";

fn permissions(scope: Scope) -> &'static str {
    match scope {
        Scope::Internal => INTERNAL_PERMISSIONS,
        Scope::Public => PUBLIC_PERMISSIONS,
    }
}

/// Short-lived bearer credential; replaced, never mutated
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: DateTime<Utc>,
    scope: Scope,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>, scope: Scope) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            scope,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Valid iff `now` is before the expiry minus the safety margin
    pub fn is_valid_at(&self, now: DateTime<Utc>, safety_margin: Duration) -> bool {
        now < self.expires_at - safety_margin
    }

    /// Whole seconds left before expiry, rounded to nearest, never negative
    pub fn seconds_to_live(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.expires_at - now).num_milliseconds();
        ((millis as f64) / 1000.0).round().max(0.0) as i64
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    expires_in: i64,
}

/// Process-wide cache of the Internal and Public credentials
pub struct TokenCache {
    http: Client,
    endpoints: Endpoints,
    client_id: String,
    client_secret: String,
    safety_margin: Duration,
    internal: Mutex<Option<Credential>>,
    public: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(http: Client, endpoints: Endpoints, config: &ApsConfig) -> Self {
        Self {
            http,
            endpoints,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            safety_margin: Duration::seconds(
                config
                    .token_safety_margin_secs
                    .clamp(0, MAX_TOKEN_SAFETY_MARGIN_SECS),
            ),
            internal: Mutex::new(None),
            public: Mutex::new(None),
        }
    }

    fn slot(&self, scope: Scope) -> &Mutex<Option<Credential>> {
        match scope {
            Scope::Internal => &self.internal,
            Scope::Public => &self.public,
        }
    }

    /// Return a valid credential for `scope`, fetching one only when the cached
    /// credential is missing or inside its safety margin.
    #[instrument(skip(self))]
    pub async fn get_credential(&self, scope: Scope) -> Result<Credential, AuthError> {
        let mut cached = self.slot(scope).lock().await;

        if let Some(credential) = cached
            .as_ref()
            .filter(|c| c.is_valid_at(Utc::now(), self.safety_margin))
        {
            debug!(%scope, "Using cached credential");
            return Ok(credential.clone());
        }

        let fresh = self.fetch(scope).await.map_err(|source| {
            warn!(%scope, error = %source, "Credential refresh failed");
            AuthError { scope, source }
        })?;

        info!(%scope, expires_at = %fresh.expires_at, "Obtained new credential");
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    async fn fetch(&self, scope: Scope) -> Result<Credential, RemoteError> {
        let response = self
            .http
            .post(self.endpoints.token())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", permissions(scope)),
            ])
            .send()
            .await?;

        let payload: TokenPayload = read_json(response).await?;

        if payload.access_token.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "identity provider returned an empty access token".to_string(),
            ));
        }

        let expires_at = Duration::try_seconds(payload.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                RemoteError::InvalidResponse(format!(
                    "identity provider returned an out-of-range expires_in: {}",
                    payload.expires_in
                ))
            })?;

        Ok(Credential::new(payload.access_token, expires_at, scope))
    }
}
