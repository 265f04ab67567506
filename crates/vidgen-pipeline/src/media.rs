//! Media catalog seam.
//!
//! Upload handling lives elsewhere; submission only needs to know
//! whether a media reference exists and who owns it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vidgen_models::OwnerId;

/// Lookup for previously-uploaded input media.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// True when the media reference exists and belongs to the owner.
    async fn exists_for_owner(&self, owner: &OwnerId, media_id: &str) -> anyhow::Result<bool>;
}

/// In-memory catalog for tests and single-node runs.
#[derive(Clone, Default)]
pub struct MemoryMediaCatalog {
    entries: Arc<RwLock<HashSet<(String, String)>>>,
}

impl MemoryMediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a media reference for an owner.
    pub async fn insert(&self, owner: &OwnerId, media_id: &str) {
        self.entries
            .write()
            .await
            .insert((owner.to_string(), media_id.to_string()));
    }
}

#[async_trait]
impl MediaCatalog for MemoryMediaCatalog {
    async fn exists_for_owner(&self, owner: &OwnerId, media_id: &str) -> anyhow::Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains(&(owner.to_string(), media_id.to_string())))
    }
}
