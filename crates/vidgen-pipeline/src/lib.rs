//! Generation pipeline orchestration.
//!
//! This crate provides:
//! - `PipelineOrchestrator` — drives the four steps of one job, writing
//!   every transition to the store before the next action
//! - `SubmissionService` — validates a submission, creates the record and
//!   hands off to the orchestrator without blocking the caller
//! - `StatusService` — ownership-enforced, read-only record access
//! - `StuckJobDetector` — background watchdog for steps stuck processing

pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod orchestrator;
pub mod status;
pub mod submit;
pub mod watchdog;

pub use config::PipelineConfig;
pub use error::{StatusError, SubmitError};
pub use logging::JobLogger;
pub use media::{MediaCatalog, MemoryMediaCatalog};
pub use orchestrator::{PipelineOrchestrator, StepExecutors};
pub use status::StatusService;
pub use submit::SubmissionService;
pub use watchdog::StuckJobDetector;
