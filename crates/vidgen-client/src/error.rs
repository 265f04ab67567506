//! Client error types.

use std::time::Duration;

use thiserror::Error;

use vidgen_pipeline::StatusError;

/// Errors from a status source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Access denied")]
    Forbidden,

    #[error("Status query failed: {0}")]
    Query(String),
}

impl From<StatusError> for SourceError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(id) => SourceError::NotFound(id),
            StatusError::Forbidden => SourceError::Forbidden,
            StatusError::Store(e) => SourceError::Query(e.to_string()),
        }
    }
}

/// Errors from polling a job.
///
/// A timeout here says nothing about the job itself: it may still be
/// running server-side. It is never folded into a job failure.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Polling timed out after {waited:?}; the job may still be running")]
    Timeout { waited: Duration },

    #[error(transparent)]
    Source(#[from] SourceError),
}
