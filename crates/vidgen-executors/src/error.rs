//! Executor error types.

use thiserror::Error;

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors from an external task executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExecutorError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn missing_input(key: impl Into<String>) -> Self {
        Self::MissingInput(key.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map a non-success HTTP status to the right variant: 429 and 5xx
    /// are worth re-issuing, anything else is not.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.as_u16() == 429 || status.is_server_error() {
            Self::Unavailable(format!("{}: {}", status, body))
        } else {
            Self::RequestFailed(format!("{}: {}", status, body))
        }
    }

    /// Check if error is retryable at the transport level.
    ///
    /// Retries here re-issue the HTTP call within one step invocation;
    /// a step that ultimately fails is never re-run for the same job.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutorError::Network(_) | ExecutorError::Unavailable(_))
    }
}
