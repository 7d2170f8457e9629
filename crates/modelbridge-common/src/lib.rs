//! ModelBridge Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the ModelBridge workspace.
//!
//! # Overview
//!
//! - **Derived identifiers**: the padding-stripped base64 `urn` every surface keys off
//! - **Types**: credential scopes, stored objects and normalized translation status
//! - **Archives**: detection of multi-file uploads that need an entrypoint
//! - **Logging**: `tracing` subscriber bootstrap shared by all binaries
//!
//! # Example
//!
//! ```
//! use modelbridge_common::urn::Urn;
//!
//! let urn = Urn::from_object_id("urn:adsk.objects:os.object:my-bucket/box.step");
//! assert!(!urn.as_str().ends_with('='));
//! assert_eq!(
//!     urn.decode_object_id().unwrap(),
//!     "urn:adsk.objects:os.object:my-bucket/box.step"
//! );
//! ```

pub mod archive;
pub mod error;
pub mod logging;
pub mod types;
pub mod urn;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{ModelEntry, Scope, StoredObject, TranslationState, TranslationStatus};
pub use urn::Urn;
