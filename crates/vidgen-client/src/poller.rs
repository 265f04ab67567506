//! Job poller.
//!
//! Queries the status source on a fixed interval until the job reaches
//! a terminal state, the maximum wait elapses, or the caller cancels.
//! Cancellation only stops observation; the pipeline keeps running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use vidgen_models::{GenerationJob, JobId, JobStatus, OwnerId};

use crate::error::PollError;
use crate::source::StatusSource;

/// Progress callback invoked with the current record on every
/// non-terminal poll.
pub type ProgressFn = Box<dyn FnMut(&GenerationJob) + Send>;

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between status queries
    pub interval: Duration,
    /// Maximum total wait before giving up
    pub max_wait: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// How a poll ended, short of an error.
#[derive(Debug)]
pub enum PollOutcome {
    /// Terminal success; the final record is attached
    Completed(GenerationJob),
    /// Terminal failure; the record carries the failing step and cause
    Failed(GenerationJob),
    /// The caller cancelled; no further queries were made
    Cancelled,
}

/// Handle to cancel an in-flight poll.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Create a cancellation handle/receiver pair for `wait`.
    pub fn pair() -> (CancelHandle, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, rx)
    }

    /// Stop the poll. Idempotent; never an error for the poll itself.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Polls a job until it is terminal.
pub struct JobPoller<S: StatusSource> {
    source: Arc<S>,
    config: PollerConfig,
}

impl<S: StatusSource> JobPoller<S> {
    /// Create a new poller.
    pub fn new(source: Arc<S>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Poll until the job is terminal.
    ///
    /// `on_progress` fires with the full current record on every poll
    /// that observes the job still processing. Exceeding `max_wait`
    /// yields `PollError::Timeout`, distinct from a failed job.
    pub async fn wait(
        &self,
        job_id: &JobId,
        requester: &OwnerId,
        mut cancel: watch::Receiver<bool>,
        mut on_progress: Option<ProgressFn>,
    ) -> Result<PollOutcome, PollError> {
        let max_wait = self.config.max_wait;

        match tokio::time::timeout(
            max_wait,
            self.poll_loop(job_id, requester, &mut cancel, &mut on_progress),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PollError::Timeout { waited: max_wait }),
        }
    }

    async fn poll_loop(
        &self,
        job_id: &JobId,
        requester: &OwnerId,
        cancel: &mut watch::Receiver<bool>,
        on_progress: &mut Option<ProgressFn>,
    ) -> Result<PollOutcome, PollError> {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut cancel_closed = false;

        loop {
            tokio::select! {
                changed = cancel.changed(), if !cancel_closed => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            debug!(job_id = %job_id, "Polling cancelled");
                            return Ok(PollOutcome::Cancelled);
                        }
                        Ok(()) => {}
                        // Sender dropped without cancelling; keep polling.
                        Err(_) => cancel_closed = true,
                    }
                }
                _ = ticker.tick() => {
                    let job = self.source.fetch(job_id, requester).await?;

                    match job.status {
                        JobStatus::Completed => return Ok(PollOutcome::Completed(job)),
                        JobStatus::Failed => return Ok(PollOutcome::Failed(job)),
                        JobStatus::Processing => {
                            debug!(
                                job_id = %job_id,
                                progress = job.progress_percent(),
                                "Job still processing"
                            );
                            if let Some(callback) = on_progress.as_mut() {
                                callback(&job);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use vidgen_models::{GenerationRequest, StepName, StepOutput, VideoStyle};

    use crate::error::SourceError;

    /// Source that replays a scripted sequence, repeating the last record.
    struct ScriptedSource {
        records: Mutex<VecDeque<GenerationJob>>,
        last: Mutex<Option<GenerationJob>>,
    }

    impl ScriptedSource {
        fn new(records: Vec<GenerationJob>) -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(records.into()),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self, _job_id: &JobId, _requester: &OwnerId) -> Result<GenerationJob, SourceError> {
            if let Some(next) = self.records.lock().unwrap().pop_front() {
                *self.last.lock().unwrap() = Some(next.clone());
                return Ok(next);
            }
            self.last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| SourceError::NotFound("scripted".to_string()))
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            input_media_id: "audio-12345".to_string(),
            prompt: "sunset over mountains".to_string(),
            target_duration_secs: 30,
            style: VideoStyle::Cinematic,
        }
    }

    fn owner() -> OwnerId {
        OwnerId::from_string("user-1")
    }

    /// Snapshots of one job advancing through the pipeline.
    fn stages() -> Vec<GenerationJob> {
        let mut job = GenerationJob::new(owner(), request());
        let mut stages = vec![job.clone()];

        for name in StepName::ALL {
            job.begin_step(name).unwrap();
            stages.push(job.clone());
            let output = match name {
                StepName::Finalization => StepOutput::new().with("video_url", "https://x/final.mp4"),
                _ => StepOutput::new().with("ok", true),
            };
            job.complete_step(name, &output).unwrap();
            stages.push(job.clone());
        }
        job.complete().unwrap();
        stages.push(job);
        stages
    }

    fn fast_config() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(5),
            max_wait: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_poll_until_completed_with_monotonic_progress() {
        let source = ScriptedSource::new(stages());
        let poller = JobPoller::new(source, fast_config());
        let (_handle, cancel) = CancelHandle::pair();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: ProgressFn = Box::new(move |job| {
            seen_clone.lock().unwrap().push(job.progress_percent());
        });

        let outcome = poller
            .wait(&JobId::new(), &owner(), cancel, Some(callback))
            .await
            .unwrap();

        let job = match outcome {
            PollOutcome::Completed(job) => job,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(job.progress_percent(), 100);

        let progress = seen.lock().unwrap();
        assert!(!progress.is_empty());
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_poll_surfaces_job_failure() {
        let mut job = GenerationJob::new(owner(), request());
        job.begin_step(StepName::Transcription).unwrap();
        job.fail_step(StepName::Transcription, "audio format unsupported").unwrap();

        let source = ScriptedSource::new(vec![job]);
        let poller = JobPoller::new(source, fast_config());
        let (_handle, cancel) = CancelHandle::pair();

        let outcome = poller.wait(&JobId::new(), &owner(), cancel, None).await.unwrap();
        let job = match outcome {
            PollOutcome::Failed(job) => job,
            other => panic!("expected failure, got {:?}", other),
        };
        assert_eq!(job.error.as_ref().unwrap().message, "audio format unsupported");
    }

    #[tokio::test]
    async fn test_poll_times_out_on_stuck_job() {
        // One processing record, repeated forever.
        let source = ScriptedSource::new(vec![GenerationJob::new(owner(), request())]);
        let poller = JobPoller::new(
            source,
            PollerConfig {
                interval: Duration::from_millis(5),
                max_wait: Duration::from_millis(50),
            },
        );
        let (_handle, cancel) = CancelHandle::pair();

        let err = poller.wait(&JobId::new(), &owner(), cancel, None).await.unwrap_err();
        assert!(matches!(err, PollError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_cancel_stops_polling_without_error() {
        let source = ScriptedSource::new(vec![GenerationJob::new(owner(), request())]);
        let poller = JobPoller::new(source, fast_config());
        let (handle, cancel) = CancelHandle::pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let outcome = poller.wait(&JobId::new(), &owner(), cancel, None).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_forbidden_source_error_propagates() {
        struct ForbiddenSource;

        #[async_trait]
        impl StatusSource for ForbiddenSource {
            async fn fetch(
                &self,
                _job_id: &JobId,
                _requester: &OwnerId,
            ) -> Result<GenerationJob, SourceError> {
                Err(SourceError::Forbidden)
            }
        }

        let poller = JobPoller::new(Arc::new(ForbiddenSource), fast_config());
        let (_handle, cancel) = CancelHandle::pair();

        let err = poller.wait(&JobId::new(), &owner(), cancel, None).await.unwrap_err();
        assert!(matches!(err, PollError::Source(SourceError::Forbidden)));
    }
}
