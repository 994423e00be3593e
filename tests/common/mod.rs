//! Stub storefront backend for integration tests.
//!
//! Serves a handful of `/api/*` routes on an ephemeral port and counts how
//! often each one is hit, so tests can tell cached reads from upstream reads.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

#[derive(Clone, Default)]
pub struct Upstream {
    hits: Arc<Mutex<HashMap<String, usize>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    failures: Arc<Mutex<usize>>,
}

impl Upstream {
    fn record(&self, route: &str) {
        *self.hits.lock().unwrap().entry(route.to_string()).or_insert(0) += 1;
    }

    /// Number of requests seen for `route`, e.g. `"GET /products"`.
    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    /// JSON bodies received by write routes, in arrival order.
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    /// Makes the next `n` requests to `/flaky` answer 503.
    pub fn fail_next(&self, n: usize) {
        *self.failures.lock().unwrap() = n;
    }
}

/// A running stub; `base_url` ends in `/api`.
pub struct StubServer {
    pub base_url: String,
    pub upstream: Upstream,
}

pub async fn spawn_upstream() -> StubServer {
    let upstream = Upstream::default();

    let app = Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/:id", get(get_product).put(update_product))
        .route("/api/categories", get(list_categories))
        .route("/api/cart", get(get_cart).post(add_to_cart))
        .route("/api/orders", post(create_order))
        .route("/api/users/:id", put(update_user))
        .route("/api/echo-query", get(echo_query))
        .route("/api/auth", get(echo_auth))
        .route("/api/app-error", get(app_error))
        .route("/api/app-error-bare", get(app_error_bare))
        .route("/api/server-error", get(server_error))
        .route("/api/flaky", get(flaky))
        .route("/api/empty", get(empty))
        .route("/api/not-json", get(not_json))
        .route("/api/no-data", post(no_data))
        .route("/api/slow", get(slow))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubServer {
        base_url: format!("http://{addr}/api"),
        upstream,
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

async fn list_products(State(up): State<Upstream>, RawQuery(query): RawQuery) -> Json<Value> {
    up.record("GET /products");
    let query = query.unwrap_or_default();
    if query.contains("featured=true") {
        return ok(json!([{ "id": "1", "name": "Desk", "featured": true }]));
    }
    ok(json!([
        { "id": "1", "name": "Desk", "query": query },
        { "id": "2", "name": "Chair" }
    ]))
}

async fn create_product(State(up): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    up.record("POST /products");
    up.bodies.lock().unwrap().push(body.clone());
    let mut created = body;
    created["id"] = json!(99);
    ok(created)
}

async fn get_product(State(up): State<Upstream>, Path(id): Path<String>) -> Response {
    up.record("GET /products/:id");
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Product not found" })),
        )
            .into_response();
    }
    ok(json!({ "id": id, "name": format!("Product {id}") })).into_response()
}

async fn update_product(
    State(up): State<Upstream>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    up.record("PUT /products/:id");
    if id == "locked" {
        return Json(json!({ "success": false, "message": "Product is locked" })).into_response();
    }
    up.bodies.lock().unwrap().push(body.clone());
    ok(json!({ "id": id, "changes": body })).into_response()
}

async fn list_categories(State(up): State<Upstream>) -> Json<Value> {
    up.record("GET /categories");
    ok(json!([{ "id": "c1", "name": "Furniture" }]))
}

async fn get_cart(State(up): State<Upstream>, RawQuery(query): RawQuery) -> Json<Value> {
    up.record("GET /cart");
    ok(json!([{ "id": "i1", "query": query }]))
}

async fn add_to_cart(State(up): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    up.record("POST /cart");
    up.bodies.lock().unwrap().push(body.clone());
    ok(body)
}

async fn create_order(State(up): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    up.record("POST /orders");
    up.bodies.lock().unwrap().push(body);
    ok(json!({ "id": "o1", "status": "pending" }))
}

async fn update_user(
    State(up): State<Upstream>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    up.record("PUT /users/:id");
    ok(json!({ "id": id, "profile": body }))
}

async fn echo_query(RawQuery(query): RawQuery) -> Json<Value> {
    ok(json!(query.unwrap_or_default()))
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ok(json!(auth))
}

async fn app_error() -> Json<Value> {
    Json(json!({ "success": false, "message": "Out of stock" }))
}

async fn app_error_bare() -> Json<Value> {
    Json(json!({ "success": false }))
}

async fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": true, "data": "ignored" })),
    )
        .into_response()
}

async fn flaky(State(up): State<Upstream>) -> Response {
    up.record("GET /flaky");
    let mut failures = up.failures.lock().unwrap();
    if *failures > 0 {
        *failures -= 1;
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ok(json!("recovered")).into_response()
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn not_json() -> &'static str {
    "<html>oops</html>"
}

async fn slow(State(up): State<Upstream>) -> Json<Value> {
    up.record("GET /slow");
    tokio::time::sleep(Duration::from_millis(500)).await;
    ok(json!("late"))
}

/// Accepts connections and closes them without answering.
pub async fn spawn_hangup_upstream() -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });
    format!("http://{addr}/api")
}

async fn no_data() -> Json<Value> {
    Json(json!({ "success": true, "message": "Done" }))
}
