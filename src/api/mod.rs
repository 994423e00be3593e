//! API Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `/api/*` - Storefront reads (cached) and writes (invalidating)
//! - `GET /cache/stats` - Cache statistics
//! - `DELETE /cache` - Drop every cache entry
//! - `POST /cache/invalidate` - Invalidate one entity or collection
//! - `GET /health` - Health check endpoint

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::{ApiJson, ApiQuery};
pub use handlers::AppState;
pub use routes::create_router;
