//! Error types for the caching gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;

use crate::client::ApiError;
use crate::models::ApiEnvelope;

// == Gateway Error Enum ==
/// Unified error type for the gateway's HTTP surface.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Upstream call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// User-scoped route called without `userId`
    #[error("userId is required")]
    MissingUser,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Api(ApiError::Http { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Api(ApiError::Application(_)) => StatusCode::BAD_REQUEST,
            GatewayError::Api(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InvalidRequest(_) | GatewayError::MissingUser => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == Extractor Rejections ==
impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "request failed");
        }

        let body = Json(ApiEnvelope::<Value>::failure(self.to_string()));
        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway handlers.
pub type Result<T> = std::result::Result<T, GatewayError>;
