//! Storefront Cache - read-through caching and API client for a storefront backend
//!
//! Provides a TTL memory cache with tag-based invalidation, a typed client
//! for the upstream `{ success, data, message }` API, and an HTTP gateway
//! that serves the storefront operations through the cache.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod storefront;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheInvalidation, MemoryCache, ReadThroughCache, SharedCache};
pub use client::{ApiClient, ApiError};
pub use config::Config;
pub use error::GatewayError;
pub use storefront::StorefrontApi;
pub use tasks::spawn_cleanup_task;
