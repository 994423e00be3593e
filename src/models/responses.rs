//! Response DTOs for the gateway API
//!
//! Bodies returned by the cache administration and health routes. The
//! `/api/*` routes answer with [`ApiEnvelope`](super::ApiEnvelope).

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub invalidations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Keys currently being fetched by a leader
    pub in_flight: usize,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, in_flight: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            invalidations: stats.invalidations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            in_flight,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared: usize,
}

impl ClearResponse {
    pub fn new(cleared: usize) -> Self {
        Self {
            message: format!("Cleared {cleared} cache entries"),
            cleared,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub cache_entries: usize,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache_entries: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache_entries,
        }
    }
}
