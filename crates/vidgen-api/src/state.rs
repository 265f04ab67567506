//! Application state.

use std::sync::Arc;

use vidgen_executors::{
    FinalizerClient, FinalizerConfig, ScenePlannerClient, ScenePlannerConfig, TranscriptionClient,
    TranscriptionConfig, VideoGeneratorClient, VideoGeneratorConfig,
};
use vidgen_pipeline::{
    MediaCatalog, PipelineOrchestrator, StatusService, StepExecutors, SubmissionService,
};
use vidgen_store::{JobStore, RedisJobStore};

use crate::config::ApiConfig;
use crate::media_catalog::HttpMediaCatalog;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn JobStore>,
    pub submissions: Arc<SubmissionService>,
    pub status: Arc<StatusService>,
}

impl AppState {
    /// Create application state from injected parts.
    ///
    /// The orchestrator and services are wired here; executor clients
    /// and the store come from the caller, which owns their lifecycle.
    pub fn with_parts(
        config: ApiConfig,
        store: Arc<dyn JobStore>,
        media: Arc<dyn MediaCatalog>,
        executors: StepExecutors,
    ) -> Self {
        let orchestrator = Arc::new(PipelineOrchestrator::new(Arc::clone(&store), executors));
        let submissions = Arc::new(SubmissionService::new(
            Arc::clone(&store),
            media,
            orchestrator,
        ));
        let status = Arc::new(StatusService::new(Arc::clone(&store)));

        Self {
            config,
            store,
            submissions,
            status,
        }
    }

    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store: Arc<dyn JobStore> = Arc::new(RedisJobStore::from_env()?);
        let media: Arc<dyn MediaCatalog> = Arc::new(HttpMediaCatalog::from_env()?);

        let executors = StepExecutors {
            transcription: Arc::new(TranscriptionClient::new(TranscriptionConfig::from_env())?),
            scene_planning: Arc::new(ScenePlannerClient::new(ScenePlannerConfig::from_env()?)?),
            video_generation: Arc::new(VideoGeneratorClient::new(VideoGeneratorConfig::from_env())?),
            finalization: Arc::new(FinalizerClient::new(FinalizerConfig::from_env())?),
        };

        Ok(Self::with_parts(config, store, media, executors))
    }
}
