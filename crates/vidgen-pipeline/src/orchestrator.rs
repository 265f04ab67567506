//! Pipeline orchestrator.
//!
//! Drives the four steps of one job in order. Every transition is
//! persisted before the next action, so a crash between steps leaves the
//! record consistent. A failed step fails the job and stops the run;
//! later steps stay pending forever.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{error, warn, Instrument};

use vidgen_executors::{TaskExecutor, TaskInput};
use vidgen_models::{GenerationJob, StepName, StepOutput};
use vidgen_store::{JobStore, StoreError};

use crate::logging::JobLogger;

/// Result-data key the finalizer must have produced for a job to count
/// as completed.
const ARTIFACT_KEY: &str = "finalization.video_url";

/// The four step executors, one per fixed pipeline position.
pub struct StepExecutors {
    pub transcription: Arc<dyn TaskExecutor>,
    pub scene_planning: Arc<dyn TaskExecutor>,
    pub video_generation: Arc<dyn TaskExecutor>,
    pub finalization: Arc<dyn TaskExecutor>,
}

impl StepExecutors {
    /// Executor for a fixed pipeline position.
    pub fn executor_for(&self, step: StepName) -> Arc<dyn TaskExecutor> {
        match step {
            StepName::Transcription => Arc::clone(&self.transcription),
            StepName::ScenePlanning => Arc::clone(&self.scene_planning),
            StepName::VideoGeneration => Arc::clone(&self.video_generation),
            StepName::Finalization => Arc::clone(&self.finalization),
        }
    }
}

/// Why a run stopped before completing the pipeline.
enum RunStop {
    /// Terminal state persisted (completed or failed); nothing left to do.
    Terminal,
    /// The store rejected or lost our write; the record on disk wins.
    StoreAbort,
}

/// Drives generation jobs through their steps.
pub struct PipelineOrchestrator {
    store: Arc<dyn JobStore>,
    executors: Arc<StepExecutors>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    ///
    /// Store and executor clients are injected here; their lifecycle is
    /// owned by the process bootstrap.
    pub fn new(store: Arc<dyn JobStore>, executors: StepExecutors) -> Self {
        Self {
            store,
            executors: Arc::new(executors),
        }
    }

    /// Run a job's pipeline as an independent task.
    ///
    /// The caller is not blocked and need not keep the handle; the task
    /// owns the job from here and never propagates step failures.
    pub fn spawn(self: &Arc<Self>, job: GenerationJob) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        let logger = JobLogger::new(&job.job_id, "generation_pipeline");
        let span = logger.create_span();

        tokio::spawn(
            async move {
                orchestrator.run(job, &logger).await;
            }
            .instrument(span),
        )
    }

    /// Execute the pipeline for one job.
    ///
    /// Public for in-process callers that want to await completion (the
    /// API layer always goes through `spawn`).
    pub async fn run(&self, mut job: GenerationJob, logger: &JobLogger) {
        logger.log_start(&format!(
            "prompt_len={} style={} target={}s",
            job.request.prompt.len(),
            job.request.style,
            job.request.target_duration_secs
        ));

        for step in StepName::ALL {
            if self.run_step(&mut job, step, logger).await.is_err() {
                return;
            }
        }

        if job.result_data.get(ARTIFACT_KEY).is_none() {
            logger.log_error("all steps completed but artifact reference is missing");
            return;
        }

        let expected = job.revision;
        match job.complete() {
            Ok(()) => {
                if self.persist(&job, expected).await.is_ok() {
                    metrics::counter!("vidgen_jobs_completed_total").increment(1);
                    logger.log_completion(&format!("progress={}%", job.progress_percent()));
                }
            }
            Err(e) => logger.log_error(&format!("cannot complete job: {}", e)),
        }
    }

    /// Run one step: persist `processing`, invoke the executor, persist
    /// the outcome.
    async fn run_step(
        &self,
        job: &mut GenerationJob,
        step: StepName,
        logger: &JobLogger,
    ) -> Result<(), RunStop> {
        let expected = job.revision;
        if let Err(e) = job.begin_step(step) {
            logger.log_error(&format!("cannot start step {}: {}", step, e));
            return Err(RunStop::StoreAbort);
        }
        self.persist(job, expected).await?;

        logger.log_progress(&format!("step {} started", step));
        let started = Instant::now();

        let result = self.invoke(step, job).await;
        metrics::histogram!("vidgen_step_duration_seconds", "step" => step.as_str())
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(output) => {
                // Completion of the final step requires the artifact
                // reference the finalizer is contracted to produce.
                if step == StepName::Finalization && !output.data.contains_key("video_url") {
                    return self
                        .record_failure(job, step, "no artifact reference produced".to_string(), logger)
                        .await;
                }

                let expected = job.revision;
                if let Err(e) = job.complete_step(step, &output) {
                    // Output failed validation; record the step as failed
                    // rather than persisting bad data.
                    warn!(step = %step, "Rejected step output: {}", e);
                    return self.record_failure(job, step, format!("invalid output: {}", e), logger).await;
                }
                self.persist(job, expected).await?;
                logger.log_progress(&format!(
                    "step {} completed ({}%)",
                    step,
                    job.progress_percent()
                ));
                Ok(())
            }
            Err(message) => self.record_failure(job, step, message, logger).await,
        }
    }

    /// Invoke an executor with panic isolation.
    ///
    /// The call runs in its own task so a panicking executor surfaces as
    /// a step failure instead of abandoning the record mid-`processing`.
    async fn invoke(&self, step: StepName, job: &GenerationJob) -> Result<StepOutput, String> {
        let executor = self.executors.executor_for(step);
        let job_id = job.job_id.clone();
        let request = job.request.clone();
        let results = job.result_data.clone();

        let handle = tokio::spawn(async move {
            executor
                .execute(TaskInput {
                    job_id: &job_id,
                    request: &request,
                    results: &results,
                })
                .await
        });

        match handle.await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_err) => Err(format!("executor panicked: {}", join_err)),
        }
    }

    /// Persist a step failure and the job's terminal state.
    async fn record_failure(
        &self,
        job: &mut GenerationJob,
        step: StepName,
        message: String,
        logger: &JobLogger,
    ) -> Result<(), RunStop> {
        metrics::counter!("vidgen_step_failures_total", "step" => step.as_str()).increment(1);
        logger.log_error(&format!("step {} failed: {}", step, message));

        let expected = job.revision;
        if let Err(e) = job.fail_step(step, message) {
            logger.log_error(&format!("cannot record failure for {}: {}", step, e));
            return Err(RunStop::StoreAbort);
        }
        self.persist(job, expected).await?;
        Err(RunStop::Terminal)
    }

    /// Write the record back, reloading on a conflict.
    ///
    /// A conflict means another writer (the watchdog) got there first; if
    /// the stored record is terminal this run is over, otherwise the
    /// stored record wins and this run stops rather than clobbering it.
    async fn persist(&self, job: &GenerationJob, expected: u64) -> Result<(), RunStop> {
        match self.store.update(job, expected).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict { .. }) => {
                match self.store.get(&job.job_id).await {
                    Ok(Some(stored)) if stored.is_terminal() => {
                        warn!(
                            job_id = %job.job_id,
                            status = %stored.status,
                            "Job was finalized by another writer; stopping run"
                        );
                    }
                    Ok(_) => {
                        error!(job_id = %job.job_id, "Lost update on job record; stopping run");
                    }
                    Err(e) => {
                        error!(job_id = %job.job_id, "Cannot reload job after conflict: {}", e);
                    }
                }
                Err(RunStop::StoreAbort)
            }
            Err(e) => {
                error!(job_id = %job.job_id, "Failed to persist job record: {}", e);
                Err(RunStop::StoreAbort)
            }
        }
    }
}
