//! Generative video executor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vidgen_models::{StepName, StepOutput, VideoStyle};

use crate::error::{ExecutorError, ExecutorResult};
use crate::executor::{TaskExecutor, TaskInput};
use crate::planner::PlannedScene;
use crate::retry::RetryPolicy;

/// Configuration for the video generation service client.
#[derive(Debug, Clone)]
pub struct VideoGeneratorConfig {
    /// Base URL of the render service
    pub base_url: String,
    /// Request timeout; renders run for minutes
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for VideoGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8020".to_string(),
            timeout: Duration::from_secs(900),
            retry: RetryPolicy::default(),
        }
    }
}

impl VideoGeneratorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RENDER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8020".to_string()),
            timeout: Duration::from_secs(
                std::env::var("RENDER_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    scenes: &'a [PlannedScene],
    style: VideoStyle,
    target_duration_secs: u32,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    artifact_id: String,
}

/// Client for the generative video render service.
pub struct VideoGeneratorClient {
    http: Client,
    config: VideoGeneratorConfig,
}

impl VideoGeneratorClient {
    /// Create a new generator client.
    pub fn new(config: VideoGeneratorConfig) -> ExecutorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ExecutorError::Network)?;
        Ok(Self { http, config })
    }

    async fn render(&self, request: &RenderRequest<'_>) -> ExecutorResult<RenderResponse> {
        let url = format!("{}/v1/render", self.config.base_url);
        debug!(scene_count = request.scenes.len(), "Requesting render");

        let response = self
            .config
            .retry
            .run("render", || async {
                let response = self
                    .http
                    .post(&url)
                    .json(request)
                    .send()
                    .await
                    .map_err(ExecutorError::Network)?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(ExecutorError::from_status(status, body));
                }
                Ok(response)
            })
            .await?;

        let parsed: RenderResponse = response.json().await?;
        if parsed.artifact_id.trim().is_empty() {
            return Err(ExecutorError::invalid_response("artifact_id is empty"));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl TaskExecutor for VideoGeneratorClient {
    fn step(&self) -> StepName {
        StepName::VideoGeneration
    }

    async fn execute(&self, input: TaskInput<'_>) -> ExecutorResult<StepOutput> {
        let scenes: Vec<PlannedScene> = input
            .results
            .get("scene_planning.scenes")
            .cloned()
            .ok_or_else(|| ExecutorError::missing_input("scene_planning.scenes"))
            .and_then(|v| {
                serde_json::from_value(v)
                    .map_err(|e| ExecutorError::invalid_response(format!("bad scene plan: {}", e)))
            })?;

        let rendered = self
            .render(&RenderRequest {
                scenes: &scenes,
                style: input.request.style,
                target_duration_secs: input.request.target_duration_secs,
            })
            .await?;

        info!(job_id = %input.job_id, artifact_id = %rendered.artifact_id, "Render complete");

        Ok(StepOutput::new().with("artifact_id", rendered.artifact_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidgen_models::{GenerationRequest, JobId, ResultData};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> VideoGeneratorClient {
        VideoGeneratorClient::new(VideoGeneratorConfig {
            base_url,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_retries: 0,
                base_delay_ms: 1,
                max_delay_ms: 1,
            },
        })
        .unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            input_media_id: "audio-12345".to_string(),
            prompt: "sunset over mountains".to_string(),
            target_duration_secs: 30,
            style: VideoStyle::Cinematic,
        }
    }

    fn results_with_plan() -> ResultData {
        let mut results = ResultData::new();
        let scenes = serde_json::json!([
            {"id": 1, "description": "peaks", "duration_secs": 30.0}
        ]);
        results
            .merge_step(
                StepName::ScenePlanning,
                &StepOutput::new().with("scene_count", 1u64).with("scenes", scenes),
            )
            .unwrap();
        results
    }

    #[tokio::test]
    async fn test_render_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/render"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "artifact_id": "artifact-789"
            })))
            .mount(&server)
            .await;

        let client = client(server.uri());
        let job_id = JobId::new();
        let request = request();
        let results = results_with_plan();

        let output = client
            .execute(TaskInput {
                job_id: &job_id,
                request: &request,
                results: &results,
            })
            .await
            .unwrap();
        assert_eq!(output.data.get("artifact_id").unwrap(), "artifact-789");
    }

    #[tokio::test]
    async fn test_missing_plan_fails() {
        let server = MockServer::start().await;
        let client = client(server.uri());
        let job_id = JobId::new();
        let request = request();
        let results = ResultData::new();

        let err = client
            .execute(TaskInput {
                job_id: &job_id,
                request: &request,
                results: &results,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::MissingInput(_)));
    }
}
