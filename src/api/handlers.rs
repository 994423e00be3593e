//! API Handlers
//!
//! HTTP request handlers for the `/api/*` storefront routes and the cache
//! administration endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::extract::{ApiJson, ApiQuery};
use crate::cache::{shared_cache, InvalidationResult, MemoryCache, SharedCache};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::models::{
    ApiEnvelope, ClearResponse, HealthResponse, InvalidateRequest, OrderStatusRequest,
    ProductListQuery, StatsResponse, UserQuery,
};
use crate::storefront::StorefrontApi;

type Envelope = Json<ApiEnvelope<Value>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub storefront: StorefrontApi,
    /// Same cache the storefront reads through
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState with an empty cache in front of `client`.
    pub fn new(client: ApiClient) -> Self {
        Self::with_cache(client, shared_cache(MemoryCache::new()))
    }

    pub fn with_cache(client: ApiClient, cache: SharedCache) -> Self {
        Self {
            storefront: StorefrontApi::new(client, cache.clone()),
            cache,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ApiClient::from_config(config))
    }
}

fn ok<T: serde::Serialize>(data: T) -> Result<Envelope> {
    let data = serde_json::to_value(data).map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(Json(ApiEnvelope::ok(data)))
}

fn ok_with_message(data: Value, message: &str) -> Result<Envelope> {
    Ok(Json(ApiEnvelope::ok_with_message(data, message)))
}

fn require_user(query: &UserQuery) -> Result<&str> {
    query.user_id().ok_or(GatewayError::MissingUser)
}

// == Products ==
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Envelope> {
    let products = state
        .storefront
        .get_products(query.limit, query.category.as_deref())
        .await?;
    ok(products)
}

pub async fn featured_products(State(state): State<AppState>) -> Result<Envelope> {
    ok(state.storefront.get_featured_products().await?)
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    ok(state.storefront.get_product(&id).await?)
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(product): ApiJson<Value>,
) -> Result<Envelope> {
    ok_with_message(state.storefront.create_product(&product).await?, "Product created")
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<Value>,
) -> Result<Envelope> {
    ok(state.storefront.update_product(&id, &changes).await?)
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    ok_with_message(state.storefront.delete_product(&id).await?, "Product deleted")
}

// == Categories ==
pub async fn list_categories(State(state): State<AppState>) -> Result<Envelope> {
    ok(state.storefront.get_categories().await?)
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(category): ApiJson<Value>,
) -> Result<Envelope> {
    ok_with_message(state.storefront.create_category(&category).await?, "Category created")
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<Value>,
) -> Result<Envelope> {
    ok(state.storefront.update_category(&id, &changes).await?)
}

// == Reviews ==
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Envelope> {
    ok(state.storefront.get_product_reviews(&product_id).await?)
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(review): ApiJson<Value>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    let review = state
        .storefront
        .create_review(user_id, &product_id, &review)
        .await?;
    ok_with_message(review, "Review submitted")
}

// == Cart ==
pub async fn get_cart(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Envelope> {
    ok(state.storefront.get_cart(require_user(&query)?).await?)
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(item): ApiJson<Value>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    ok_with_message(state.storefront.add_to_cart(user_id, &item).await?, "Added to cart")
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(changes): ApiJson<Value>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    ok(state
        .storefront
        .update_cart_item(user_id, &item_id, &changes)
        .await?)
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    ok(state.storefront.remove_cart_item(user_id, &item_id).await?)
}

pub async fn clear_cart(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Envelope> {
    ok(state.storefront.clear_cart(require_user(&query)?).await?)
}

// == Orders ==
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Envelope> {
    ok(state.storefront.get_orders(require_user(&query)?).await?)
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Envelope> {
    ok(state.storefront.get_order(&order_id).await?)
}

pub async fn create_order(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(order): ApiJson<Value>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    ok_with_message(state.storefront.create_order(user_id, &order).await?, "Order placed")
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(req): ApiJson<OrderStatusRequest>,
) -> Result<Envelope> {
    if let Some(error_msg) = req.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }
    let user_id = require_user(&query)?;
    ok(state
        .storefront
        .update_order_status(user_id, &order_id, &req.status)
        .await?)
}

// == Services ==
pub async fn list_services(State(state): State<AppState>) -> Result<Envelope> {
    ok(state.storefront.get_services().await?)
}

pub async fn create_booking(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(booking): ApiJson<Value>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    let booking = state
        .storefront
        .create_booking(user_id, &service_id, &booking)
        .await?;
    ok_with_message(booking, "Booking confirmed")
}

// == Addresses ==
pub async fn list_addresses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Envelope> {
    ok(state.storefront.get_addresses(require_user(&query)?).await?)
}

pub async fn create_address(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(address): ApiJson<Value>,
) -> Result<Envelope> {
    let user_id = require_user(&query)?;
    ok_with_message(state.storefront.create_address(user_id, &address).await?, "Address saved")
}

// == Profile ==
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Envelope> {
    ok(state.storefront.get_profile(&user_id).await?)
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(changes): ApiJson<Value>,
) -> Result<Envelope> {
    ok(state.storefront.update_profile(&user_id, &changes).await?)
}

// == Cache Administration ==
/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::new(&stats, state.storefront.in_flight()))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let result = state.storefront.invalidation().invalidate_all().await;
    Json(ClearResponse::new(result.count))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<InvalidateRequest>,
) -> Json<ApiEnvelope<InvalidationResult>> {
    let id = req.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let result = state
        .storefront
        .invalidation()
        .invalidate_entity(req.entity, id)
        .await;
    Json(ApiEnvelope::ok(result))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let entries = state.cache.read().await.len();
    Json(HealthResponse::healthy(entries))
}
