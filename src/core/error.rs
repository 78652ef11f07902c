// Error handling for the chunkscope pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ingestion cancelled")]
    Cancelled,

    #[error("Ingestion worker failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for ViewerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            ViewerError::Cancelled
        } else {
            ViewerError::Join(err.to_string())
        }
    }
}
