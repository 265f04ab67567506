//! Output assembly executor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use vidgen_models::{StepName, StepOutput};

use crate::error::{ExecutorError, ExecutorResult};
use crate::executor::{TaskExecutor, TaskInput};
use crate::retry::RetryPolicy;

/// Configuration for the finalizer service client.
#[derive(Debug, Clone)]
pub struct FinalizerConfig {
    /// Base URL of the assembly service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for FinalizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8030".to_string(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

impl FinalizerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("FINALIZER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8030".to_string()),
            timeout: Duration::from_secs(
                std::env::var("FINALIZER_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FinalizeRequest<'a> {
    artifact_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FinalizeResponse {
    video_url: String,
    #[serde(default)]
    duration_secs: Option<f64>,
}

/// Client for the output assembly service.
pub struct FinalizerClient {
    http: Client,
    config: FinalizerConfig,
}

impl FinalizerClient {
    /// Create a new finalizer client.
    pub fn new(config: FinalizerConfig) -> ExecutorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ExecutorError::Network)?;
        Ok(Self { http, config })
    }

    async fn finalize(&self, artifact_id: &str) -> ExecutorResult<FinalizeResponse> {
        let url = format!("{}/v1/finalize", self.config.base_url);

        let response = self
            .config
            .retry
            .run("finalize", || async {
                let response = self
                    .http
                    .post(&url)
                    .json(&FinalizeRequest { artifact_id })
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

        let parsed: FinalizeResponse = response.json().await?;
        if parsed.video_url.trim().is_empty() {
            return Err(ExecutorError::invalid_response("video_url is empty"));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl TaskExecutor for FinalizerClient {
    fn step(&self) -> StepName {
        StepName::Finalization
    }

    async fn execute(&self, input: TaskInput<'_>) -> ExecutorResult<StepOutput> {
        let artifact_id = input
            .results
            .get("video_generation.artifact_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ExecutorError::missing_input("video_generation.artifact_id"))?;

        let finalized = self.finalize(artifact_id).await?;

        info!(job_id = %input.job_id, video_url = %finalized.video_url, "Finalized video");

        let mut output = StepOutput::new().with("video_url", finalized.video_url);
        if let Some(duration) = finalized.duration_secs {
            output = output.with("duration_secs", duration);
        }
        Ok(output)
    }
}
