//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::client::RetryPolicy;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream storefront API
    pub upstream_base_url: String,
    /// Service-role key sent as a bearer token to the upstream
    pub service_role_key: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Retries for transient upstream failures, `0` disables retrying
    pub retry_max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_BASE_URL`, else `NEXT_PUBLIC_BASE_URL` (default: http://localhost:3000/api)
    /// - `SERVICE_ROLE_KEY`, else `SUPABASE_SERVICE_ROLE_KEY` (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 300)
    /// - `RETRY_MAX_ATTEMPTS` - Transient failure retries (default: 0)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 200)
    /// - `REQUEST_TIMEOUT_SECS` - Upstream timeout (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .or_else(|_| env::var("NEXT_PUBLIC_BASE_URL"))
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_base_url),
            service_role_key: env::var("SERVICE_ROLE_KEY")
                .or_else(|_| env::var("SUPABASE_SERVICE_ROLE_KEY"))
                .ok()
                .filter(|v| !v.trim().is_empty()),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            retry_max_attempts: parse_var("RETRY_MAX_ATTEMPTS")
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay_ms: parse_var("RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.retry_base_delay_ms),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS"),
        }
    }

    /// Retry policy for the upstream client.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.retry_max_attempts == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::exponential(
                self.retry_max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            )
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_base_url: "http://localhost:3000/api".to_string(),
            service_role_key: None,
            server_port: 8080,
            cleanup_interval: 300,
            retry_max_attempts: 0,
            retry_base_delay_ms: 200,
            request_timeout_secs: None,
        }
    }
}
