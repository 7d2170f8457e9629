pub mod upload;

pub use upload::{UploadModelCommand, MODEL_ENTRYPOINT_FIELD, MODEL_FILE_FIELD};
