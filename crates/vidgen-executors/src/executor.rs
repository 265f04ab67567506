//! The executor trait.

use async_trait::async_trait;

use vidgen_models::{GenerationRequest, JobId, ResultData, StepName, StepOutput};

use crate::error::ExecutorResult;

/// What an executor sees of a job: the submission payload and everything
/// earlier steps produced. Executors never see job status or ownership.
#[derive(Clone, Copy)]
pub struct TaskInput<'a> {
    pub job_id: &'a JobId,
    pub request: &'a GenerationRequest,
    pub results: &'a ResultData,
}

/// One pipeline step's external call.
///
/// Implementations are safe to reuse across jobs; the pipeline never
/// re-invokes a step for the same job.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// The step this executor performs.
    fn step(&self) -> StepName;

    /// Perform the step, returning output to merge into the job's
    /// result data.
    async fn execute(&self, input: TaskInput<'_>) -> ExecutorResult<StepOutput>;
}
