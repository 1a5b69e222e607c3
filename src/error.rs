use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A form field the report cannot be generated without.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An upload the decoder accepted but that cannot be placed.
    #[error("image error: {0}")]
    Image(String),

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task store error: {0}")]
    TaskStore(String),
}
