//! Request and Response models for the gateway API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod envelope;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use envelope::ApiEnvelope;
pub use requests::{InvalidateRequest, OrderStatusRequest, ProductListQuery, UserQuery};
pub use responses::{ClearResponse, HealthResponse, StatsResponse};
