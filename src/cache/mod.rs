//! Cache Module
//!
//! In-memory TTL cache, read-through wrapper, key builders and the
//! invalidation registry.

mod entry;
mod invalidation;
pub mod keys;
mod read_through;
mod stats;
mod store;
mod tags;


use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use invalidation::{CacheInvalidation, InvalidationResult};
pub use keys::CacheKey;
pub use read_through::ReadThroughCache;
pub use stats::CacheStats;
pub use store::MemoryCache;
pub use tags::{Entity, Tag, TagIndex};

/// The cache shared across request handlers and the cleanup task.
pub type SharedCache = Arc<RwLock<MemoryCache<Value>>>;

/// Wraps a cache for sharing.
pub fn shared_cache(cache: MemoryCache<Value>) -> SharedCache {
    Arc::new(RwLock::new(cache))
}
