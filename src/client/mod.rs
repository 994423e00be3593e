//! Client Module
//!
//! HTTP client for the upstream storefront backend.

mod api_client;
mod error;
mod query;
mod retry;

pub use api_client::ApiClient;
pub use error::{ApiError, ErrorKind, Result, FALLBACK_MESSAGE};
pub use query::query_pairs;
pub use retry::RetryPolicy;
