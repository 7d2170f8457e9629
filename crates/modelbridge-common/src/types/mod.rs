//! Common types used across ModelBridge

use serde::{Deserialize, Serialize};

use crate::urn::Urn;

/// Trust level a credential is issued for
///
/// The two scopes are cached independently and are never substituted for
/// one another: `Internal` can write to the bucket, `Public` can only stream
/// viewables and is the only one ever handed to a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Internal,
    Public,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Internal => "internal",
            Scope::Public => "public",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object stored in the remote bucket
///
/// Identity is `object_id`; the urn is always derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub object_id: String,
    pub urn: Urn,
}

impl StoredObject {
    pub fn new(key: impl Into<String>, object_id: impl Into<String>) -> Self {
        let object_id = object_id.into();
        let urn = Urn::from_object_id(&object_id);
        Self {
            key: key.into(),
            object_id,
            urn,
        }
    }
}

/// `{name, urn}` pair handed to the selection surface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub urn: Urn,
}

impl From<StoredObject> for ModelEntry {
    fn from(object: StoredObject) -> Self {
        Self {
            name: object.key,
            urn: object.urn,
        }
    }
}

/// Normalized state of a translation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationState {
    Pending,
    InProgress,
    Complete,
    Failed,
    /// The remote service has no manifest for the urn (yet)
    NotFound,
}

impl TranslationState {
    /// No further change is expected without a new submission
    pub fn is_terminal(self) -> bool {
        matches!(self, TranslationState::Complete | TranslationState::Failed)
    }
}

impl std::fmt::Display for TranslationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TranslationState::Pending => "pending",
            TranslationState::InProgress => "in-progress",
            TranslationState::Complete => "complete",
            TranslationState::Failed => "failed",
            TranslationState::NotFound => "not-found",
        };
        f.write_str(s)
    }
}

/// Read-through projection of the remote manifest, recomputed on every poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStatus {
    pub state: TranslationState,
    pub progress: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
}

impl TranslationStatus {
    /// Neutral status for a urn the remote service has not registered
    pub fn not_found() -> Self {
        Self {
            state: TranslationState::NotFound,
            progress: String::new(),
            messages: None,
        }
    }
}
