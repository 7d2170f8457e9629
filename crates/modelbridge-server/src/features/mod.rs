//! Feature modules implementing the ModelBridge API
//!
//! # Features
//!
//! - **auth**: read-only viewer tokens
//! - **models**: listing, upload-and-translate, and translation status
//!
//! Each feature owns its `routes.rs`; write operations live under
//! `commands/`. Reads go straight to the [`IngestService`].

pub mod auth;
pub mod models;

use axum::Router;

use crate::ingest::IngestService;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub ingest: IngestService,
}

/// Creates the API router with all feature routes mounted
///
/// - `/auth` - viewer token issuance
/// - `/models` - model listing, upload and status
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/auth", auth::auth_routes().with_state(state.ingest.clone()))
        .nest("/models", models::models_routes().with_state(state.ingest))
}
