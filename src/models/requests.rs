//! Request DTOs for the gateway API
//!
//! Query strings and bodies accepted by the `/api/*` and `/cache/*` routes.

use serde::Deserialize;

use crate::cache::Entity;

/// Query for `GET /api/products`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

/// `?userId=` on user-scoped routes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl UserQuery {
    /// Returns the user id unless it is missing or blank.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Body for `PUT /api/orders/:id/status`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusRequest {
    pub status: String,
}

impl OrderStatusRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.status.trim().is_empty() {
            return Some("Status cannot be empty".to_string());
        }
        None
    }
}

/// Body for `POST /cache/invalidate`
///
/// Without an `id` the whole entity collection is invalidated.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub entity: Entity,
    #[serde(default)]
    pub id: Option<String>,
}
