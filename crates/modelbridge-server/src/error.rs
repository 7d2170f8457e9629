//! Server-specific error types
//!
//! Each pipeline component has its own error so a caller can tell which step
//! failed: a file that was stored but could not be converted surfaces as a
//! [`TranslationError`], never as an [`UploadError`]. The not-found manifest
//! case is not an error at all; see `aps::derivative::StatusResolver`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use modelbridge_common::Scope;
use thiserror::Error;

use crate::api::response::ErrorResponse;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, AppError>;

/// Failure talking to one of the remote services
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status; `body` is kept verbatim
    #[error("service responded {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Credential acquisition failed; no stale or default credential is substituted
#[derive(Error, Debug)]
#[error("Could not obtain {scope} access: {source}")]
pub struct AuthError {
    pub scope: Scope,
    #[source]
    pub source: RemoteError,
}

/// Object transfer or bucket access failed
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Bucket '{bucket}' is not accessible: {source}")]
    Bucket {
        bucket: String,
        #[source]
        source: RemoteError,
    },

    #[error("Upload of '{key}' failed: {source}")]
    Transfer {
        key: String,
        #[source]
        source: RemoteError,
    },

    #[error("Listing bucket '{bucket}' failed: {source}")]
    List {
        bucket: String,
        #[source]
        source: RemoteError,
    },
}

/// Translation job could not be submitted
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Archive input without a root filename; raised before any network call
    #[error("'{name}' is an archive; the filename of the main design inside it is required")]
    MissingEntrypoint { name: String },

    #[error("Translation of '{object_id}' was rejected: {source}")]
    Rejected {
        object_id: String,
        #[source]
        source: RemoteError,
    },
}

/// Querying translation status failed (distinct from the not-found status)
#[derive(Error, Debug)]
#[error("Status query for '{urn}' failed: {source}")]
pub struct StatusQueryError {
    pub urn: String,
    #[source]
    pub source: RemoteError,
}

/// Error surfaced by the ingestion façade
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    StatusQuery(#[from] StatusQueryError),

    #[error("Uploaded file name cannot be empty")]
    EmptyName,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone())
            },
            AppError::Ingest(IngestError::EmptyName) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string())
            },
            AppError::Ingest(IngestError::Translation(TranslationError::MissingEntrypoint {
                ..
            })) => (StatusCode::BAD_REQUEST, "MISSING_ENTRYPOINT", self.to_string()),
            AppError::Ingest(IngestError::Auth(_)) => (
                StatusCode::BAD_GATEWAY,
                "AUTH_ERROR",
                "Could not obtain access to the model service".to_string(),
            ),
            AppError::Ingest(IngestError::Upload(_)) => {
                (StatusCode::BAD_GATEWAY, "UPLOAD_ERROR", self.to_string())
            },
            AppError::Ingest(IngestError::Translation(TranslationError::Rejected { .. })) => {
                (StatusCode::BAD_GATEWAY, "TRANSLATION_ERROR", self.to_string())
            },
            AppError::Ingest(IngestError::StatusQuery(_)) => {
                (StatusCode::BAD_GATEWAY, "STATUS_QUERY_ERROR", self.to_string())
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
