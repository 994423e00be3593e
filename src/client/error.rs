//! Error types for the upstream API client.

use thiserror::Error;

/// Message used when a failed envelope carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "Request failed";

// == Error Kind ==
/// Whether retrying the same request can reasonably succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network hiccups, timeouts, overloaded upstream
    Transient,
    /// Everything else
    Permanent,
}

// == Api Error ==
/// Errors raised by [`ApiClient`](crate::client::ApiClient).
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx HTTP status, whatever the body says
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// 2xx response whose envelope reports `success: false`
    #[error("{0}")]
    Application(String),

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not a valid envelope
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Classifies the failure at the point it was raised.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http { status, .. } => match status {
                408 | 429 | 502 | 503 | 504 => ErrorKind::Transient,
                _ => ErrorKind::Permanent,
            },
            ApiError::Transport(e) if e.is_timeout() || e.is_connect() => ErrorKind::Transient,
            _ => ErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Convenience Result type for the client.
pub type Result<T> = std::result::Result<T, ApiError>;
