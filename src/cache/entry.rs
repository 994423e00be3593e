//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::Tag;

// == Cache Entry ==
/// Represents a single cache entry with its data and freshness metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored data
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Time to live in milliseconds
    pub ttl: u64,
    /// Dependency tags registered with the entry
    pub tags: Vec<Tag>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `data` - The value to store
    /// * `ttl_seconds` - TTL in seconds
    pub fn new(data: T, ttl_seconds: u64) -> Self {
        Self {
            data,
            timestamp: current_timestamp_ms(),
            ttl: ttl_seconds.saturating_mul(1000),
            tags: Vec::new(),
        }
    }

    /// Attaches dependency tags to the entry.
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry stays fresh while `now - timestamp <= ttl`
    /// and expires strictly after the TTL has elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) > self.ttl
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let age = current_timestamp_ms().saturating_sub(self.timestamp);
        self.ttl.saturating_sub(age)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as `0`.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
