//! HTTP API client.
//!
//! Thin binding of the submission and status endpoints, mirroring the
//! server DTOs. Doubles as a remote `StatusSource` for the poller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use vidgen_models::{GenerationJob, GenerationRequest, JobId, JobStatus, OwnerId};

use crate::error::SourceError;
use crate::source::StatusSource;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the VidGen API
    pub base_url: String,
    /// Bearer token presented on every request
    pub auth_token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ApiClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, SourceError> {
        let auth_token = std::env::var("VIDGEN_API_TOKEN")
            .map_err(|_| SourceError::Query("VIDGEN_API_TOKEN not set".to_string()))?;

        Ok(Self {
            base_url: std::env::var("VIDGEN_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            auth_token,
            timeout: Duration::from_secs(30),
        })
    }
}

/// Response to a submission.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Client for the VidGen HTTP API.
pub struct ApiClient {
    http: Client,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ApiClientConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Query(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Submit a generation request.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<SubmitResponse, SourceError> {
        let url = format!("{}/api/generations", self.config.base_url);
        debug!(url = %url, "Submitting generation request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.auth_token)
            .json(request)
            .send()
            .await
            .map_err(|e| SourceError::Query(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_error(status, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Query(format!("unparseable submit response: {}", e)))
    }

    /// Fetch a job record.
    pub async fn job_status(&self, job_id: &JobId) -> Result<GenerationJob, SourceError> {
        let url = format!("{}/api/generations/{}", self.config.base_url, job_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.auth_token)
            .send()
            .await
            .map_err(|e| SourceError::Query(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_error(status, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Query(format!("unparseable job record: {}", e)))
    }

    async fn map_error(status: StatusCode, response: reqwest::Response) -> SourceError {
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.detail)
            .unwrap_or_else(|_| status.to_string());

        match status {
            StatusCode::NOT_FOUND => SourceError::NotFound(detail),
            StatusCode::FORBIDDEN => SourceError::Forbidden,
            _ => SourceError::Query(format!("{}: {}", status, detail)),
        }
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch(&self, job_id: &JobId, _requester: &OwnerId) -> Result<GenerationJob, SourceError> {
        // The server derives the requester from the bearer token.
        self.job_status(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidgen_models::{OwnerId, VideoStyle};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> ApiClient {
        ApiClient::new(ApiClientConfig {
            base_url,
            auth_token: "token-123".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generations"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "job_id": "job-1",
                "status": "processing"
            })))
            .mount(&server)
            .await;

        let request = GenerationRequest {
            input_media_id: "audio-12345".to_string(),
            prompt: "sunset over mountains".to_string(),
            target_duration_secs: 30,
            style: VideoStyle::Cinematic,
        };

        let response = client(server.uri()).submit(&request).await.unwrap();
        assert_eq!(response.job_id.as_str(), "job-1");
        assert_eq!(response.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_status_maps_not_found_and_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/generations/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": "Job not found"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/generations/other-users"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "detail": "Access denied"
            })))
            .mount(&server)
            .await;

        let client = client(server.uri());

        let err = client.job_status(&JobId::from_string("missing")).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));

        let err = client
            .fetch(&JobId::from_string("other-users"), &OwnerId::from_string("u"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Forbidden));
    }
}
