use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::get,
    Json, Router,
};
use modelbridge_common::{ModelEntry, TranslationStatus, Urn};

use super::commands::{upload, UploadModelCommand};
use crate::error::ServerResult;
use crate::ingest::IngestService;

pub fn models_routes() -> Router<IngestService> {
    Router::new()
        .route(
            "/",
            get(list_models).post(upload_model).layer(DefaultBodyLimit::disable()),
        )
        .route("/:urn/status", get(get_model_status))
}

#[tracing::instrument(skip(service))]
async fn list_models(State(service): State<IngestService>) -> ServerResult<Json<Vec<ModelEntry>>> {
    let models = service.list_models().await?;
    Ok(Json(models))
}

#[tracing::instrument(skip(service, multipart))]
async fn upload_model(
    State(service): State<IngestService>,
    multipart: Multipart,
) -> ServerResult<Json<ModelEntry>> {
    let command = UploadModelCommand::from_multipart(multipart).await?;
    let entry = upload::handle(service, command).await?;
    Ok(Json(entry))
}

/// Status of a translation; an unknown urn answers `not-found`, not 404
#[tracing::instrument(skip(service))]
async fn get_model_status(
    State(service): State<IngestService>,
    Path(urn): Path<String>,
) -> ServerResult<Json<TranslationStatus>> {
    let status = service.get_status(&Urn::new(urn)).await?;
    Ok(Json(status))
}
