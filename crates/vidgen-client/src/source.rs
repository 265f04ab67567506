//! Status source seam.

use async_trait::async_trait;

use vidgen_models::{GenerationJob, JobId, OwnerId};
use vidgen_pipeline::StatusService;

use crate::error::SourceError;

/// Where the poller reads job records from.
///
/// Implemented by the in-process `StatusService` and by `ApiClient` for
/// remote polling.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current record for a job.
    async fn fetch(&self, job_id: &JobId, requester: &OwnerId) -> Result<GenerationJob, SourceError>;
}

#[async_trait]
impl StatusSource for StatusService {
    async fn fetch(&self, job_id: &JobId, requester: &OwnerId) -> Result<GenerationJob, SourceError> {
        Ok(self.get(job_id, requester).await?)
    }
}
