//! Status query service.

use std::sync::Arc;

use vidgen_models::{GenerationJob, JobId, OwnerId};
use vidgen_store::JobStore;

use crate::error::StatusError;

/// Read-only access to job records, enforcing ownership.
///
/// Never mutates; safe to call with arbitrary concurrency.
pub struct StatusService {
    store: Arc<dyn JobStore>,
}

impl StatusService {
    /// Create a new status service.
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Fetch a job record for its owner.
    pub async fn get(&self, job_id: &JobId, requester: &OwnerId) -> Result<GenerationJob, StatusError> {
        let job = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| StatusError::NotFound(job_id.to_string()))?;

        if &job.owner_id != requester {
            return Err(StatusError::Forbidden);
        }

        Ok(job)
    }

    /// List the requester's jobs, newest first.
    pub async fn list(&self, requester: &OwnerId) -> Result<Vec<GenerationJob>, StatusError> {
        Ok(self.store.list_for_owner(requester).await?)
    }
}
