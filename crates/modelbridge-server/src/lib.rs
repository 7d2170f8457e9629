//! ModelBridge Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP server that takes CAD design files from a browser viewer, stores them
//! in a cloud bucket, asks the remote platform to translate them into a
//! web-viewable format, and reports translation progress.
//!
//! # Overview
//!
//! - **Remote clients** ([`aps`]): token cache, object store, translation
//!   submitter and status resolver
//! - **Ingestion façade** ([`ingest`]): the four operations the HTTP surface exposes
//! - **API Endpoints** ([`features`]): `/api/auth/token` and `/api/models`
//! - **Configuration**: environment-based configuration management
//! - **Middleware**: CORS and request logging
//!
//! # Example
//!
//! ```no_run
//! use modelbridge_server::{api, config::Config, ingest::IngestService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let ingest = IngestService::new(&config.aps)?;
//!     api::serve(config, ingest).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod aps;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, IngestError, ServerResult};
