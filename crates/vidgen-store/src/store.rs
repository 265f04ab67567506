//! The job store trait.

use async_trait::async_trait;

use vidgen_models::{GenerationJob, JobId, OwnerId};

use crate::error::StoreResult;

/// Persistence seam for generation job records.
///
/// The orchestrator is the sole writer for any given job; the conditional
/// `update` still guards against lost updates should that ever change
/// (e.g. the watchdog failing a job the orchestrator is mid-write on).
/// Reads must observe the latest committed write for a record.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a brand-new record, all steps pending.
    ///
    /// Fails with `AlreadyExists` if the job ID is taken.
    async fn create(&self, job: &GenerationJob) -> StoreResult<()>;

    /// Fetch a record by ID.
    async fn get(&self, job_id: &JobId) -> StoreResult<Option<GenerationJob>>;

    /// Persist a mutated record, conditional on the stored revision still
    /// being `expected_revision`.
    ///
    /// Fails with `Conflict` when another write got there first; the
    /// caller reloads and re-decides rather than clobbering.
    async fn update(&self, job: &GenerationJob, expected_revision: u64) -> StoreResult<()>;

    /// All non-terminal jobs, for the stuck-job watchdog.
    async fn list_active(&self) -> StoreResult<Vec<GenerationJob>>;

    /// A user's jobs, newest first.
    async fn list_for_owner(&self, owner: &OwnerId) -> StoreResult<Vec<GenerationJob>>;
}
