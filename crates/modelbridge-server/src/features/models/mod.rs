pub mod commands;
pub mod routes;

pub use commands::{UploadModelCommand, MODEL_ENTRYPOINT_FIELD, MODEL_FILE_FIELD};
pub use routes::models_routes;
