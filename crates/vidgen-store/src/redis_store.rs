//! Redis-backed job store.
//!
//! Records are JSON blobs under `vidgen:job:{id}`. A per-owner sorted set
//! and an active-jobs set serve the list queries without scans. Updates
//! go through a Lua compare-and-set on the record's revision.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use vidgen_models::{GenerationJob, JobId, OwnerId};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

const ACTIVE_SET_KEY: &str = "vidgen:jobs:active";

/// Compare-and-set on the stored record's revision.
///
/// KEYS[1] = job key, KEYS[2] = active set
/// ARGV[1] = expected revision, ARGV[2] = payload, ARGV[3] = terminal flag,
/// ARGV[4] = job id
/// Returns 1 on success, -1 when the key is missing, -2 on mismatch.
const UPDATE_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
  return -1
end
local record = cjson.decode(current)
if tonumber(record['revision']) ~= tonumber(ARGV[1]) then
  return -2
end
redis.call('SET', KEYS[1], ARGV[2])
if ARGV[3] == '1' then
  redis.call('SREM', KEYS[2], ARGV[4])
end
return 1
"#;

/// Redis store configuration.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis URL
    pub redis_url: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl RedisStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        }
    }
}

/// Job record store backed by Redis.
pub struct RedisJobStore {
    client: redis::Client,
    update_script: redis::Script,
}

impl RedisJobStore {
    /// Create a new Redis store.
    pub fn new(config: RedisStoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self {
            client,
            update_script: redis::Script::new(UPDATE_SCRIPT),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(RedisStoreConfig::from_env())
    }

    fn job_key(job_id: &str) -> String {
        format!("vidgen:job:{}", job_id)
    }

    fn owner_key(owner: &str) -> String {
        format!("vidgen:owner:{}:jobs", owner)
    }

    async fn fetch_many(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        ids: &[String],
    ) -> StoreResult<Vec<GenerationJob>> {
        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            let payload: Option<String> = conn.get(Self::job_key(id)).await?;
            match payload {
                Some(json) => match serde_json::from_str::<GenerationJob>(&json) {
                    Ok(job) => jobs.push(job),
                    Err(e) => warn!(job_id = %id, "Skipping unreadable job record: {}", e),
                },
                None => debug!(job_id = %id, "Indexed job record is gone"),
            }
        }
        Ok(jobs)
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, job: &GenerationJob) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        let key = Self::job_key(job.job_id.as_str());

        let created: bool = redis::cmd("SET")
            .arg(&key)
            .arg(&payload)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if !created {
            return Err(StoreError::AlreadyExists(job.job_id.to_string()));
        }

        conn.sadd::<_, _, ()>(ACTIVE_SET_KEY, job.job_id.as_str()).await?;
        conn.zadd::<_, _, _, ()>(
            Self::owner_key(job.owner_id.as_str()),
            job.job_id.as_str(),
            job.created_at.timestamp_millis(),
        )
        .await?;

        debug!(job_id = %job.job_id, "Created job record");
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> StoreResult<Option<GenerationJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload: Option<String> = conn.get(Self::job_key(job_id.as_str())).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, job: &GenerationJob, expected_revision: u64) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        let outcome: i64 = self
            .update_script
            .key(Self::job_key(job.job_id.as_str()))
            .key(ACTIVE_SET_KEY)
            .arg(expected_revision)
            .arg(&payload)
            .arg(if job.is_terminal() { "1" } else { "0" })
            .arg(job.job_id.as_str())
            .invoke_async(&mut conn)
            .await?;

        match outcome {
            1 => Ok(()),
            -1 => Err(StoreError::not_found(job.job_id.as_str())),
            _ => Err(StoreError::Conflict {
                job_id: job.job_id.to_string(),
                expected: expected_revision,
            }),
        }
    }

    async fn list_active(&self) -> StoreResult<Vec<GenerationJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let ids: Vec<String> = conn.smembers(ACTIVE_SET_KEY).await?;
        let jobs = self.fetch_many(&mut conn, &ids).await?;

        // Terminal records can linger in the set if a process died between
        // the record write and the SREM; drop them here.
        let mut active = Vec::with_capacity(jobs.len());
        for job in jobs {
            if job.is_terminal() {
                conn.srem::<_, _, ()>(ACTIVE_SET_KEY, job.job_id.as_str()).await?;
            } else {
                active.push(job);
            }
        }
        Ok(active)
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> StoreResult<Vec<GenerationJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Newest first via the creation-time score.
        let ids: Vec<String> = redis::cmd("ZREVRANGE")
            .arg(Self::owner_key(owner.as_str()))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;

        self.fetch_many(&mut conn, &ids).await
    }
}
