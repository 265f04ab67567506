//! Shared data models for the VidGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their per-step records
//! - Pipeline step names and statuses
//! - The accumulated result-data map
//! - Submission requests and their validation rules

pub mod job;
pub mod request;
pub mod result_data;
pub mod step;

// Re-export common types
pub use job::{GenerationJob, JobFailure, JobId, JobStatus, OwnerId, TransitionError};
pub use request::{is_valid_media_id, GenerationRequest, VideoStyle, MAX_PROMPT_LENGTH};
pub use result_data::{ResultData, StepOutput};
pub use step::{StepName, StepRecord, StepStatus};
