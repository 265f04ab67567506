//! Submission service.
//!
//! Validates a generation request, creates the job record atomically
//! with all four steps pending, and hands off to the orchestrator. The
//! caller gets the new record back immediately; the pipeline runs on
//! its own.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use vidgen_models::{is_valid_media_id, GenerationJob, GenerationRequest, OwnerId};
use vidgen_store::JobStore;

use crate::error::SubmitError;
use crate::media::MediaCatalog;
use crate::orchestrator::PipelineOrchestrator;

/// Accepts generation submissions.
pub struct SubmissionService {
    store: Arc<dyn JobStore>,
    media: Arc<dyn MediaCatalog>,
    orchestrator: Arc<PipelineOrchestrator>,
}

impl SubmissionService {
    /// Create a new submission service.
    pub fn new(
        store: Arc<dyn JobStore>,
        media: Arc<dyn MediaCatalog>,
        orchestrator: Arc<PipelineOrchestrator>,
    ) -> Self {
        Self {
            store,
            media,
            orchestrator,
        }
    }

    /// Validate and accept a submission.
    ///
    /// Returns the freshly-created record (`status = processing`, all
    /// steps pending); the pipeline is already running when this
    /// returns. Validation and ownership failures are synchronous and
    /// leave no record behind.
    pub async fn submit(
        &self,
        owner: OwnerId,
        request: GenerationRequest,
    ) -> Result<GenerationJob, SubmitError> {
        validate_request(&request)?;

        if !is_valid_media_id(&request.input_media_id) {
            return Err(SubmitError::validation("Invalid media ID format"));
        }

        let owned = self
            .media
            .exists_for_owner(&owner, &request.input_media_id)
            .await
            .map_err(|e| SubmitError::Catalog(e.to_string()))?;
        if !owned {
            return Err(SubmitError::MediaNotFound(request.input_media_id.clone()));
        }

        let job = GenerationJob::new(owner, request);
        self.store.create(&job).await?;

        metrics::counter!("vidgen_jobs_submitted_total").increment(1);
        info!(
            job_id = %job.job_id,
            owner_id = %job.owner_id,
            style = %job.request.style,
            "Accepted generation job"
        );

        self.orchestrator.spawn(job.clone());

        Ok(job)
    }
}

/// Flatten validator output into one message.
fn validate_request(request: &GenerationRequest) -> Result<(), SubmitError> {
    request.validate().map_err(|errors| {
        let detail = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        SubmitError::Validation(detail)
    })
}
