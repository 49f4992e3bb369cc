use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Vector store backend error: {0}")]
    Backend(String),

    #[error("Vector store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
