//! Speech-to-text executor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vidgen_models::{StepName, StepOutput};

use crate::error::{ExecutorError, ExecutorResult};
use crate::executor::{TaskExecutor, TaskInput};
use crate::retry::RetryPolicy;

/// Configuration for the transcription service client.
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    /// Base URL of the speech-to-text service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8010".to_string(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

impl TranscriptionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("SPEECH_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8010".to_string()),
            timeout: Duration::from_secs(
                std::env::var("SPEECH_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    media_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// Client for the speech-to-text service.
pub struct TranscriptionClient {
    http: Client,
    config: TranscriptionConfig,
}

impl TranscriptionClient {
    /// Create a new transcription client.
    pub fn new(config: TranscriptionConfig) -> ExecutorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ExecutorError::Network)?;
        Ok(Self { http, config })
    }

    async fn transcribe(&self, media_id: &str) -> ExecutorResult<TranscribeResponse> {
        let url = format!("{}/v1/transcribe", self.config.base_url);
        debug!(media_id = %media_id, "Requesting transcription");

        let response = self
            .config
            .retry
            .run("transcribe", || async {
                let response = self
                    .http
                    .post(&url)
                    .json(&TranscribeRequest { media_id })
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

        let parsed: TranscribeResponse = response.json().await?;
        if parsed.text.trim().is_empty() {
            return Err(ExecutorError::invalid_response("transcript is empty"));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl TaskExecutor for TranscriptionClient {
    fn step(&self) -> StepName {
        StepName::Transcription
    }

    async fn execute(&self, input: TaskInput<'_>) -> ExecutorResult<StepOutput> {
        let transcript = self.transcribe(&input.request.input_media_id).await?;

        let mut output = StepOutput::new().with("text", transcript.text);
        if let Some(language) = transcript.language {
            output = output.with("language", language);
        }
        Ok(output)
    }
}
