//! Background service for failing jobs stuck mid-step.
//!
//! The orchestrator has no step timeout of its own; if its process dies
//! after marking a step `processing`, the record would stay there
//! forever. This detector runs periodically, finds active jobs whose
//! current step has been processing longer than the configured maximum,
//! and fails them with a descriptive timeout error.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};

use vidgen_store::{JobStore, StoreError};

use crate::config::PipelineConfig;

/// Stuck job detector service.
pub struct StuckJobDetector {
    store: Arc<dyn JobStore>,
    config: PipelineConfig,
}

impl StuckJobDetector {
    /// Create a new detector.
    pub fn new(store: Arc<dyn JobStore>, config: PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Start the background detection loop.
    ///
    /// Runs indefinitely; spawn it as a background task.
    pub async fn run(&self) {
        if !self.config.watchdog_enabled {
            info!("Stuck job detection is disabled");
            return;
        }

        info!(
            "Starting stuck job detector (interval: {:?}, max step duration: {:?})",
            self.config.watchdog_interval, self.config.max_step_duration
        );

        let mut ticker = interval(self.config.watchdog_interval);

        loop {
            ticker.tick().await;

            match self.check_once().await {
                Ok((stuck, recovered)) if stuck > 0 => {
                    info!("Stuck job scan complete: {} stuck, {} failed", stuck, recovered);
                }
                Ok(_) => {}
                Err(e) => error!("Stuck job detection error: {}", e),
            }
        }
    }

    /// Run a single detection cycle.
    ///
    /// Returns (stuck, recovered) counts.
    pub async fn check_once(&self) -> anyhow::Result<(u32, u32)> {
        let active = self.store.list_active().await?;

        let mut stuck_count = 0u32;
        let mut recovered_count = 0u32;
        let now = Utc::now();

        for job in active {
            let Some(index) = job.processing_step() else {
                continue;
            };
            let step = job.steps[index].name;
            let Some(started_at) = job.steps[index].started_at else {
                continue;
            };

            let elapsed = (now - started_at).num_seconds();
            if elapsed <= self.config.max_step_duration.as_secs() as i64 {
                continue;
            }

            stuck_count += 1;
            warn!(
                job_id = %job.job_id,
                step = %step,
                elapsed_secs = elapsed,
                "Detected stuck job"
            );

            let mut job = job;
            let expected = job.revision;
            let message = format!(
                "Step {} timed out after {}s; the pipeline worker may have died",
                step, elapsed
            );
            if let Err(e) = job.fail_step(step, message) {
                warn!(job_id = %job.job_id, "Cannot fail stuck job: {}", e);
                continue;
            }

            match self.store.update(&job, expected).await {
                Ok(()) => {
                    recovered_count += 1;
                    info!(job_id = %job.job_id, step = %step, "Failed stuck job");
                }
                Err(StoreError::Conflict { .. }) => {
                    // The orchestrator moved the job on after all.
                    info!(job_id = %job.job_id, "Job advanced before recovery; leaving it");
                }
                Err(e) => {
                    error!(job_id = %job.job_id, "Failed to persist stuck job recovery: {}", e);
                }
            }
        }

        Ok((stuck_count, recovered_count))
    }
}
