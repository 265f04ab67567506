//! Job record store backends.
//!
//! This crate provides:
//! - The `JobStore` trait the orchestrator and status service write/read
//!   through
//! - An in-memory store for tests and single-node runs
//! - A Redis-backed store with revision-guarded conditional writes

pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use redis_store::{RedisJobStore, RedisStoreConfig};
pub use store::JobStore;
