//! Request extractors whose rejections answer with the failure envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::GatewayError;

/// `axum::Json` with [`GatewayError`] as its rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(GatewayError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with [`GatewayError`] as its rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(GatewayError))]
pub struct ApiQuery<T>(pub T);
