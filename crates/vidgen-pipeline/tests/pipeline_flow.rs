//! End-to-end pipeline tests over the in-memory store and stub executors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use vidgen_executors::{ExecutorError, ExecutorResult, TaskExecutor, TaskInput};
use vidgen_models::{
    GenerationJob, GenerationRequest, JobStatus, OwnerId, StepName, StepOutput, StepStatus,
    VideoStyle,
};
use vidgen_pipeline::{
    JobLogger, MemoryMediaCatalog, PipelineConfig, PipelineOrchestrator, StatusService,
    StepExecutors, StuckJobDetector, SubmissionService, SubmitError,
};
use vidgen_store::{JobStore, MemoryJobStore, StoreResult};

#[derive(Clone)]
enum Behavior {
    Succeed(StepOutput),
    Fail(String),
    Panic,
    Hang,
}

struct StubExecutor {
    step: StepName,
    behavior: Behavior,
}

impl StubExecutor {
    fn new(step: StepName, behavior: Behavior) -> Arc<dyn TaskExecutor> {
        Arc::new(Self { step, behavior })
    }

    fn succeed(step: StepName, output: StepOutput) -> Arc<dyn TaskExecutor> {
        Self::new(step, Behavior::Succeed(output))
    }
}

#[async_trait]
impl TaskExecutor for StubExecutor {
    fn step(&self) -> StepName {
        self.step
    }

    async fn execute(&self, _input: TaskInput<'_>) -> ExecutorResult<StepOutput> {
        match &self.behavior {
            Behavior::Succeed(output) => Ok(output.clone()),
            Behavior::Fail(message) => Err(ExecutorError::request_failed(message.clone())),
            Behavior::Panic => panic!("executor blew up"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        }
    }
}

fn happy_executors() -> StepExecutors {
    StepExecutors {
        transcription: StubExecutor::succeed(
            StepName::Transcription,
            StepOutput::new().with("text", "a calm evening"),
        ),
        scene_planning: StubExecutor::succeed(
            StepName::ScenePlanning,
            StepOutput::new().with("scene_count", 2u64),
        ),
        video_generation: StubExecutor::succeed(
            StepName::VideoGeneration,
            StepOutput::new().with("artifact_id", "artifact-789"),
        ),
        finalization: StubExecutor::succeed(
            StepName::Finalization,
            StepOutput::new().with("video_url", "https://cdn.example.com/final.mp4"),
        ),
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

async fn run_pipeline(store: Arc<dyn JobStore>, executors: StepExecutors) -> GenerationJob {
    let orchestrator = PipelineOrchestrator::new(Arc::clone(&store), executors);
    let job = GenerationJob::new(owner(), request());
    store.create(&job).await.unwrap();

    let logger = JobLogger::new(&job.job_id, "test_pipeline");
    orchestrator.run(job.clone(), &logger).await;

    store.get(&job.job_id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_successful_run_completes_all_steps() {
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let stored = run_pipeline(Arc::clone(&store), happy_executors()).await;

    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.progress_percent(), 100);
    assert!(stored.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert!(stored
        .steps
        .iter()
        .all(|s| s.completed_at.unwrap() >= s.started_at.unwrap()));

    // Each step's output landed in its own namespace.
    assert!(stored.result_data.get("transcription.text").is_some());
    assert!(stored.result_data.get("scene_planning.scene_count").is_some());
    assert!(stored.result_data.get("video_generation.artifact_id").is_some());
    assert_eq!(
        stored.result_data.get("finalization.video_url").unwrap(),
        "https://cdn.example.com/final.mp4"
    );
}

#[tokio::test]
async fn test_step_failure_halts_pipeline() {
    let mut executors = happy_executors();
    executors.scene_planning = StubExecutor::new(
        StepName::ScenePlanning,
        Behavior::Fail("planner quota exhausted".to_string()),
    );

    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let stored = run_pipeline(Arc::clone(&store), executors).await;

    assert_eq!(stored.status, JobStatus::Failed);
    let failure = stored.error.as_ref().unwrap();
    assert_eq!(failure.step, StepName::ScenePlanning);
    assert!(failure.message.contains("planner quota exhausted"));

    // Exactly one failed step; everything after it stays pending.
    assert_eq!(stored.steps[0].status, StepStatus::Completed);
    assert_eq!(stored.steps[1].status, StepStatus::Failed);
    assert_eq!(stored.steps[2].status, StepStatus::Pending);
    assert_eq!(stored.steps[3].status, StepStatus::Pending);

    // Completed work before the failure is preserved.
    assert!(stored.result_data.get("transcription.text").is_some());
    assert!(stored.result_data.get("scene_planning.scene_count").is_none());
}

#[tokio::test]
async fn test_executor_panic_becomes_step_failure() {
    let mut executors = happy_executors();
    executors.video_generation = StubExecutor::new(StepName::VideoGeneration, Behavior::Panic);

    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let stored = run_pipeline(Arc::clone(&store), executors).await;

    // The record is not abandoned mid-processing.
    assert_eq!(stored.status, JobStatus::Failed);
    let failure = stored.error.as_ref().unwrap();
    assert_eq!(failure.step, StepName::VideoGeneration);
    assert!(failure.message.contains("panicked"));
}

#[tokio::test]
async fn test_finalizer_without_artifact_fails_job() {
    let mut executors = happy_executors();
    executors.finalization = StubExecutor::succeed(
        StepName::Finalization,
        StepOutput::new().with("duration_secs", 29.7),
    );

    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let stored = run_pipeline(Arc::clone(&store), executors).await;

    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error.as_ref().unwrap().step, StepName::Finalization);
}

/// Store wrapper that snapshots step statuses at every persisted write.
struct RecordingStore {
    inner: MemoryJobStore,
    snapshots: tokio::sync::Mutex<Vec<Vec<StepStatus>>>,
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn create(&self, job: &GenerationJob) -> StoreResult<()> {
        self.inner.create(job).await
    }

    async fn get(&self, job_id: &vidgen_models::JobId) -> StoreResult<Option<GenerationJob>> {
        self.inner.get(job_id).await
    }

    async fn update(&self, job: &GenerationJob, expected_revision: u64) -> StoreResult<()> {
        self.snapshots
            .lock()
            .await
            .push(job.steps.iter().map(|s| s.status).collect());
        self.inner.update(job, expected_revision).await
    }

    async fn list_active(&self) -> StoreResult<Vec<GenerationJob>> {
        self.inner.list_active().await
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> StoreResult<Vec<GenerationJob>> {
        self.inner.list_for_owner(owner).await
    }
}

#[tokio::test]
async fn test_every_transition_is_persisted_in_order() {
    let store = Arc::new(RecordingStore {
        inner: MemoryJobStore::new(),
        snapshots: tokio::sync::Mutex::new(Vec::new()),
    });
    let stored = run_pipeline(store.clone() as Arc<dyn JobStore>, happy_executors()).await;
    assert_eq!(stored.status, JobStatus::Completed);

    let snapshots = store.snapshots.lock().await;
    // begin + complete per step, plus the final job completion.
    assert_eq!(snapshots.len(), 9);

    // At most one step is processing in any persisted state, and a step's
    // `processing` write always lands before its `completed` write.
    for snapshot in snapshots.iter() {
        let processing = snapshot.iter().filter(|s| **s == StepStatus::Processing).count();
        assert!(processing <= 1);
    }
    for (i, name) in StepName::ALL.iter().enumerate() {
        let begin = snapshots
            .iter()
            .position(|s| s[name.index()] == StepStatus::Processing)
            .unwrap_or_else(|| panic!("step {} never persisted as processing", name));
        let complete = snapshots
            .iter()
            .position(|s| s[name.index()] == StepStatus::Completed)
            .unwrap();
        assert!(begin < complete, "step {} ({}) completed before processing", name, i);
    }
}

#[tokio::test]
async fn test_submission_rejects_invalid_requests_without_records() {
    let store = Arc::new(MemoryJobStore::new());
    let media = Arc::new(MemoryMediaCatalog::new());
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        store.clone() as Arc<dyn JobStore>,
        happy_executors(),
    ));
    let service = SubmissionService::new(
        store.clone() as Arc<dyn JobStore>,
        media.clone(),
        orchestrator,
    );

    let mut bad = request();
    bad.prompt = String::new();
    let err = service.submit(owner(), bad).await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation(_)));

    let mut unowned = request();
    unowned.input_media_id = "audio-67890".to_string();
    let err = service.submit(owner(), unowned).await.unwrap_err();
    assert!(matches!(err, SubmitError::MediaNotFound(_)));

    assert!(store.list_for_owner(&owner()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submission_returns_while_pipeline_runs() {
    let store = Arc::new(MemoryJobStore::new());
    let media = Arc::new(MemoryMediaCatalog::new());
    media.insert(&owner(), "audio-12345").await;

    let mut executors = happy_executors();
    executors.transcription = StubExecutor::new(StepName::Transcription, Behavior::Hang);

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        store.clone() as Arc<dyn JobStore>,
        executors,
    ));
    let service = SubmissionService::new(
        store.clone() as Arc<dyn JobStore>,
        media.clone(),
        orchestrator,
    );

    let job = service.submit(owner(), request()).await.unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert!(job.steps.iter().all(|s| s.status == StepStatus::Pending));

    // The pipeline keeps running server-side after submit returned.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stored = store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Processing);
    assert_eq!(stored.steps[0].status, StepStatus::Processing);
}

#[tokio::test]
async fn test_status_service_round_trip_mid_pipeline() {
    let store = Arc::new(MemoryJobStore::new());
    let mut job = GenerationJob::new(owner(), request());
    job.begin_step(StepName::Transcription).unwrap();
    job.complete_step(StepName::Transcription, &StepOutput::new().with("text", "hi"))
        .unwrap();
    job.begin_step(StepName::ScenePlanning).unwrap();
    store.create(&job).await.unwrap();

    let status = StatusService::new(store.clone() as Arc<dyn JobStore>);
    let fetched = status.get(&job.job_id, &owner()).await.unwrap();

    assert_eq!(fetched.steps[0].status, StepStatus::Completed);
    assert_eq!(fetched.steps[1].status, StepStatus::Processing);
    assert_eq!(fetched.progress_percent(), 25);
}

#[tokio::test]
async fn test_watchdog_fails_stuck_jobs_only() {
    let store = Arc::new(MemoryJobStore::new());

    // One job stuck in transcription for 20 minutes.
    let mut stuck = GenerationJob::new(owner(), request());
    stuck.begin_step(StepName::Transcription).unwrap();
    stuck.steps[0].started_at = Some(Utc::now() - chrono::Duration::minutes(20));
    store.create(&stuck).await.unwrap();

    // One job freshly processing.
    let mut fresh = GenerationJob::new(owner(), request());
    fresh.begin_step(StepName::Transcription).unwrap();
    store.create(&fresh).await.unwrap();

    let config = PipelineConfig {
        max_step_duration: Duration::from_secs(900),
        ..PipelineConfig::default()
    };
    let detector = StuckJobDetector::new(store.clone() as Arc<dyn JobStore>, config);
    let (stuck_count, recovered) = detector.check_once().await.unwrap();

    assert_eq!(stuck_count, 1);
    assert_eq!(recovered, 1);

    let failed = store.get(&stuck.job_id).await.unwrap().unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    let failure = failed.error.as_ref().unwrap();
    assert_eq!(failure.step, StepName::Transcription);
    assert!(failure.message.contains("timed out"));

    let untouched = store.get(&fresh.job_id).await.unwrap().unwrap();
    assert_eq!(untouched.status, JobStatus::Processing);
}
