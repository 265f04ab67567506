//! LLM scene-planning executor.
//!
//! Turns the user prompt plus the transcription into an ordered scene
//! plan by calling a generative-text API with a JSON response mime type.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vidgen_models::{StepName, StepOutput};

use crate::error::{ExecutorError, ExecutorResult};
use crate::executor::{TaskExecutor, TaskInput};
use crate::retry::RetryPolicy;

/// Configuration for the scene planner.
#[derive(Debug, Clone)]
pub struct ScenePlannerConfig {
    /// Generative API endpoint
    pub api_url: String,
    /// API key, sent as a query parameter
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl ScenePlannerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ExecutorResult<Self> {
        let api_key = std::env::var("PLANNER_API_KEY")
            .map_err(|_| ExecutorError::config("PLANNER_API_KEY not set"))?;

        Ok(Self {
            api_url: std::env::var("PLANNER_API_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                    .to_string()
            }),
            api_key,
            timeout: Duration::from_secs(
                std::env::var("PLANNER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            retry: RetryPolicy::default(),
        })
    }
}

#[derive(Debug, Serialize)]
struct PlannerRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PlannerResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// One planned scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedScene {
    pub id: u32,
    pub description: String,
    pub duration_secs: f64,
    #[serde(default)]
    pub mood: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScenePlan {
    scenes: Vec<PlannedScene>,
}

/// Client for the generative scene-planning API.
pub struct ScenePlannerClient {
    http: Client,
    config: ScenePlannerConfig,
}

impl ScenePlannerClient {
    /// Create a new planner client.
    pub fn new(config: ScenePlannerConfig) -> ExecutorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ExecutorError::Network)?;
        Ok(Self { http, config })
    }

    fn build_prompt(input: &TaskInput<'_>, transcript: &str) -> String {
        format!(
            "You are planning scenes for a short generated video.\n\
             Style: {style}. Target duration: {duration} seconds.\n\
             Creative brief: {prompt}\n\n\
             Transcript of the input media:\n{transcript}\n\n\
             Respond with JSON: {{\"scenes\": [{{\"id\": 1, \"description\": \"...\", \
             \"duration_secs\": 5.0, \"mood\": \"...\"}}]}}. \
             Scene durations must sum to roughly the target duration.",
            style = input.request.style,
            duration = input.request.target_duration_secs,
            prompt = input.request.prompt,
            transcript = transcript,
        )
    }

    async fn plan(&self, prompt: String) -> ExecutorResult<Vec<PlannedScene>> {
        let url = format!("{}?key={}", self.config.api_url, self.config.api_key);

        let request = PlannerRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .config
            .retry
            .run("plan_scenes", || async {
                let response = self
                    .http
                    .post(&url)
                    .json(&request)
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

        let parsed: PlannerResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ExecutorError::invalid_response("no candidates in planner response"))?;

        let plan: ScenePlan = serde_json::from_str(text)
            .map_err(|e| ExecutorError::invalid_response(format!("unparseable scene plan: {}", e)))?;

        if plan.scenes.is_empty() {
            return Err(ExecutorError::invalid_response("scene plan is empty"));
        }
        if plan.scenes.iter().any(|s| s.duration_secs <= 0.0) {
            return Err(ExecutorError::invalid_response(
                "scene plan contains non-positive durations",
            ));
        }

        debug!(scene_count = plan.scenes.len(), "Parsed scene plan");
        Ok(plan.scenes)
    }
}

#[async_trait]
impl TaskExecutor for ScenePlannerClient {
    fn step(&self) -> StepName {
        StepName::ScenePlanning
    }

    async fn execute(&self, input: TaskInput<'_>) -> ExecutorResult<StepOutput> {
        let transcript = input
            .results
            .get("transcription.text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ExecutorError::missing_input("transcription.text"))?;

        let prompt = Self::build_prompt(&input, transcript);
        let scenes = self.plan(prompt).await?;

        info!(job_id = %input.job_id, scene_count = scenes.len(), "Scene plan ready");

        Ok(StepOutput::new()
            .with("scene_count", scenes.len() as u64)
            .with("scenes", serde_json::to_value(&scenes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidgen_models::{GenerationRequest, JobId, ResultData, VideoStyle};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> ScenePlannerConfig {
        ScenePlannerConfig {
            api_url: format!("{}/v1beta/generate", base_url),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_retries: 0,
                base_delay_ms: 1,
                max_delay_ms: 1,
            },
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            input_media_id: "audio-12345".to_string(),
            prompt: "sunset over mountains".to_string(),
            target_duration_secs: 30,
            style: VideoStyle::Cinematic,
        }
    }

    fn results_with_transcript() -> ResultData {
        let mut results = ResultData::new();
        results
            .merge_step(
                StepName::Transcription,
                &StepOutput::new().with("text", "a calm evening"),
            )
            .unwrap();
        results
    }

    fn planner_body(scenes_json: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": scenes_json.to_string() }]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_plan_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/generate"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(planner_body(serde_json::json!({
                "scenes": [
                    {"id": 1, "description": "wide shot of peaks", "duration_secs": 12.0, "mood": "serene"},
                    {"id": 2, "description": "sun dips below ridge", "duration_secs": 18.0}
                ]
            }))))
            .mount(&server)
            .await;

        let client = ScenePlannerClient::new(config(server.uri())).unwrap();
        let job_id = JobId::new();
        let request = request();
        let results = results_with_transcript();

        let output = client
            .execute(TaskInput {
                job_id: &job_id,
                request: &request,
                results: &results,
            })
            .await
            .unwrap();

        assert_eq!(output.data.get("scene_count").unwrap(), 2);
        let scenes: Vec<PlannedScene> =
            serde_json::from_value(output.data.get("scenes").unwrap().clone()).unwrap();
        assert_eq!(scenes[0].id, 1);
    }

    #[tokio::test]
    async fn test_missing_transcript_fails_without_calling_service() {
        let server = MockServer::start().await;
        let client = ScenePlannerClient::new(config(server.uri())).unwrap();
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

    #[tokio::test]
    async fn test_empty_plan_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(planner_body(serde_json::json!({"scenes": []}))),
            )
            .mount(&server)
            .await;

        let client = ScenePlannerClient::new(config(server.uri())).unwrap();
        let job_id = JobId::new();
        let request = request();
        let results = results_with_transcript();

        let err = client
            .execute(TaskInput {
                job_id: &job_id,
                request: &request,
                results: &results,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidResponse(_)));
    }
}
