//! Error types shared across ModelBridge crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid urn '{urn}': {reason}")]
    InvalidUrn { urn: String, reason: String },
}
