//! Collection and archive error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid collection JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed package: {0}")]
    Format(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("inconsistent collection: {0}")]
    Consistency(String),

    #[error("failed to close collection: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Close(Vec<CollectionError>),
}
