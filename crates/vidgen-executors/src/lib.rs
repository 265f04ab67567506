//! External task executors.
//!
//! One adapter per pipeline step, each calling an external service over
//! HTTP and returning key-value output for the job's result data:
//! - `TranscriptionClient` — speech-to-text
//! - `ScenePlannerClient` — LLM scene planning
//! - `VideoGeneratorClient` — generative video rendering
//! - `FinalizerClient` — output assembly
//!
//! Executors receive their configuration at construction; lifecycle is
//! owned by the process bootstrap.

pub mod error;
pub mod executor;
pub mod finalizer;
pub mod generator;
pub mod planner;
pub mod retry;
pub mod transcription;

pub use error::{ExecutorError, ExecutorResult};
pub use executor::{TaskExecutor, TaskInput};
pub use finalizer::{FinalizerClient, FinalizerConfig};
pub use generator::{VideoGeneratorClient, VideoGeneratorConfig};
pub use planner::{PlannedScene, ScenePlannerClient, ScenePlannerConfig};
pub use retry::RetryPolicy;
pub use transcription::{TranscriptionClient, TranscriptionConfig};
