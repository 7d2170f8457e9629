//! Viewer token route
//!
//! The viewer calls this whenever it needs a fresh bearer token, so the server
//! never polls on its behalf. Only Public-scope tokens are ever returned.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::ServerResult;
use crate::ingest::{IngestService, ViewerToken};

pub fn auth_routes() -> Router<IngestService> {
    Router::new().route("/token", get(get_token))
}

/// GET /token
#[tracing::instrument(skip(service))]
async fn get_token(State(service): State<IngestService>) -> ServerResult<Json<ViewerToken>> {
    let token = service.issue_public_token().await?;
    Ok(Json(token))
}
