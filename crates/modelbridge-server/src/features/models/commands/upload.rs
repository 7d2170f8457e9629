use axum::{body::Bytes, extract::Multipart};
use modelbridge_common::ModelEntry;

use crate::error::{AppError, ServerResult};
use crate::ingest::IngestService;

/// Multipart field carrying the design file
pub const MODEL_FILE_FIELD: &str = "model-file";

/// Multipart field naming the main design inside an archive
pub const MODEL_ENTRYPOINT_FIELD: &str = "model-zip-entrypoint";

#[derive(Debug, Clone)]
pub struct UploadModelCommand {
    pub filename: String,
    pub content: Bytes,
    pub entrypoint: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadModelError {
    #[error("No file provided in field 'model-file'")]
    FileRequired,
    #[error("Uploaded file must have a name")]
    FilenameRequired,
}

impl From<UploadModelError> for AppError {
    fn from(err: UploadModelError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl UploadModelCommand {
    /// Read the form fields; unknown fields are skipped
    pub async fn from_multipart(mut multipart: Multipart) -> ServerResult<Self> {
        let mut file: Option<(String, Bytes)> = None;
        let mut entrypoint: Option<String> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
        {
            let field_name = field.name().unwrap_or_default().to_string();

            match field_name.as_str() {
                MODEL_FILE_FIELD => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file bytes: {}", e))
                    })?;
                    file = Some((filename, content));
                },
                MODEL_ENTRYPOINT_FIELD => {
                    let text = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read entrypoint: {}", e))
                    })?;
                    entrypoint = Some(text);
                },
                _ => {},
            }
        }

        let (filename, content) = file.ok_or(UploadModelError::FileRequired)?;

        Ok(Self {
            filename,
            content,
            entrypoint,
        })
    }

    pub fn validate(&self) -> Result<(), UploadModelError> {
        if self.filename.trim().is_empty() {
            return Err(UploadModelError::FilenameRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(service, command), fields(filename = %command.filename))]
pub async fn handle(service: IngestService, command: UploadModelCommand) -> ServerResult<ModelEntry> {
    command.validate()?;

    let entry = service
        .upload_and_translate(&command.filename, command.content, command.entrypoint.as_deref())
        .await?;

    tracing::info!(name = %entry.name, urn = %entry.urn, "Model uploaded and translation started");
    Ok(entry)
}
