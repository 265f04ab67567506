//! Media catalog binding.
//!
//! Uploads are handled by a separate media service; submission only asks
//! it whether a reference exists for the requesting owner.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use vidgen_models::OwnerId;
use vidgen_pipeline::MediaCatalog;

/// Configuration for the media service client.
#[derive(Debug, Clone)]
pub struct MediaCatalogConfig {
    /// Base URL of the media service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl MediaCatalogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MEDIA_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8040".to_string()),
            timeout: Duration::from_secs(
                std::env::var("MEDIA_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Media catalog backed by the media service.
pub struct HttpMediaCatalog {
    http: Client,
    config: MediaCatalogConfig,
}

impl HttpMediaCatalog {
    /// Create a new media catalog client.
    pub fn new(config: MediaCatalogConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(MediaCatalogConfig::from_env())
    }
}

#[async_trait]
impl MediaCatalog for HttpMediaCatalog {
    async fn exists_for_owner(&self, owner: &OwnerId, media_id: &str) -> anyhow::Result<bool> {
        let url = format!(
            "{}/v1/media/{}?owner={}",
            self.config.base_url, media_id, owner
        );

        let response = self.http.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(false),
            status => anyhow::bail!("media service returned {}", status),
        }
    }
}
