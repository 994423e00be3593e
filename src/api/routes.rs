//! API Routes
//!
//! Configures the Axum router with the storefront and cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::*;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, both frontends call the gateway directly
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/featured", get(featured_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category))
        .route(
            "/reviews/:product_id",
            get(product_reviews).post(create_review),
        )
        .route(
            "/cart",
            get(get_cart).post(add_to_cart).delete(clear_cart),
        )
        .route(
            "/cart/:item_id",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(update_order_status))
        .route("/services", get(list_services))
        .route("/services/:id/bookings", post(create_booking))
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/users/:user_id", get(get_profile).put(update_profile));

    Router::new()
        .nest("/api", api)
        .route("/cache", axum::routing::delete(clear_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
