//! Generation job handlers.
//!
//! Submission returns immediately with the new job ID; the pipeline
//! runs asynchronously and clients poll the status endpoint.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use vidgen_models::{GenerationJob, GenerationRequest, JobId, JobStatus};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// Response to a submission.
#[derive(Serialize)]
pub struct SubmitGenerationResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Full job record plus derived progress.
#[derive(Serialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub job: GenerationJob,
    /// Completed steps over total steps, 0-100
    pub progress: u8,
}

/// Summary of a job for listing.
#[derive(Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub style: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// List response.
#[derive(Serialize)]
pub struct ListGenerationsResponse {
    pub jobs: Vec<JobSummary>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/generations
///
/// Validate and accept a generation job.
///
/// Returns:
/// - 202: Job accepted; body carries the job ID for polling
/// - 400: Malformed or out-of-range submission
/// - 401: Not authenticated
/// - 404: Input media does not exist for this user
pub async fn submit_generation(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<GenerationRequest>,
) -> ApiResult<(StatusCode, Json<SubmitGenerationResponse>)> {
    info!(
        uid = %user.uid,
        media_id = %request.input_media_id,
        style = %request.style,
        "submit_generation"
    );

    let job = state.submissions.submit(user.owner_id(), request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitGenerationResponse {
            job_id: job.job_id,
            status: job.status,
        }),
    ))
}

/// GET /api/generations/:job_id
///
/// Get the current record of a generation job.
///
/// Returns:
/// - 200: Full job record with per-step status and accumulated results
/// - 401: Not authenticated
/// - 403: Job belongs to another user
/// - 404: Job not found
pub async fn get_generation(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<JobStatusResponse>> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }

    let job = state
        .status
        .get(&JobId::from_string(job_id), &user.owner_id())
        .await?;

    let progress = job.progress_percent();
    Ok(Json(JobStatusResponse { job, progress }))
}

/// GET /api/generations
///
/// List the authenticated user's jobs, newest first.
pub async fn list_generations(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ListGenerationsResponse>> {
    let jobs = state.status.list(&user.owner_id()).await?;

    let summaries = jobs
        .into_iter()
        .map(|j| JobSummary {
            progress: j.progress_percent(),
            job_id: j.job_id,
            status: j.status,
            style: j.request.style.to_string(),
            error: j.error.map(|e| format!("{}: {}", e.step, e.message)),
            created_at: j.created_at.to_rfc3339(),
            updated_at: j.updated_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(ListGenerationsResponse { jobs: summaries }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Validate job ID format to prevent injection attacks.
///
/// Valid format: alphanumeric characters and hyphens only, 8-64 chars.
fn is_valid_job_id(id: &str) -> bool {
    if id.len() > 64 || id.len() < 8 {
        return false;
    }
    id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
