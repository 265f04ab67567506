//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vidgen_models::{GenerationJob, JobId, OwnerId};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

/// In-memory store for tests and single-node runs.
///
/// The write lock serializes mutations, so the revision check is exact.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<HashMap<String, GenerationJob>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: &GenerationJob) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(job.job_id.as_str()) {
            return Err(StoreError::AlreadyExists(job.job_id.to_string()));
        }
        jobs.insert(job.job_id.to_string(), job.clone());
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> StoreResult<Option<GenerationJob>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(job_id.as_str()).cloned())
    }

    async fn update(&self, job: &GenerationJob, expected_revision: u64) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(job.job_id.as_str())
            .ok_or_else(|| StoreError::not_found(job.job_id.as_str()))?;

        if stored.revision != expected_revision {
            return Err(StoreError::Conflict {
                job_id: job.job_id.to_string(),
                expected: expected_revision,
            });
        }

        *stored = job.clone();
        Ok(())
    }

    async fn list_active(&self) -> StoreResult<Vec<GenerationJob>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().filter(|j| !j.is_terminal()).cloned().collect())
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> StoreResult<Vec<GenerationJob>> {
        let jobs = self.jobs.read().await;
        let mut owned: Vec<GenerationJob> = jobs
            .values()
            .filter(|j| &j.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
