//! Polling client for generation jobs.
//!
//! This crate provides:
//! - `JobPoller` — repeatedly queries a `StatusSource` until the job is
//!   terminal, a maximum wait elapses, or the caller cancels
//! - `ApiClient` — HTTP binding of the submission and status endpoints,
//!   usable as a remote `StatusSource`

pub mod api_client;
pub mod error;
pub mod poller;
pub mod source;

pub use api_client::{ApiClient, ApiClientConfig, SubmitResponse};
pub use error::{PollError, SourceError};
pub use poller::{CancelHandle, JobPoller, PollOutcome, PollerConfig, ProgressFn};
pub use source::StatusSource;
