//! Pipeline error types.

use thiserror::Error;

use vidgen_store::StoreError;

/// Errors surfaced synchronously at submission time.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Input media not found: {0}")]
    MediaNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Media catalog error: {0}")]
    Catalog(String),
}

impl SubmitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Errors from the status query service.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Access denied")]
    Forbidden,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
