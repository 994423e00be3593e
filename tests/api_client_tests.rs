//! Integration Tests for the upstream API client
//!
//! Drives `ApiClient` and `StorefrontApi` against a stub backend on an
//! ephemeral port.

mod common;

use std::time::Duration;

use serde_json::{json, Value};
use storefront_cache::cache::{keys, shared_cache, MemoryCache};
use storefront_cache::client::{ApiClient, ApiError, ErrorKind, RetryPolicy, FALLBACK_MESSAGE};
use storefront_cache::StorefrontApi;
use tokio_test::{assert_err, assert_ok};

use common::{spawn_hangup_upstream, spawn_upstream};

// == Envelope Unwrapping ==

#[tokio::test]
async fn test_success_envelope_returns_data() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let categories: Vec<Value> = assert_ok!(client.get("/categories", &()).await);

    assert_eq!(categories, vec![json!({"id": "c1", "name": "Furniture"})]);
}

#[tokio::test]
async fn test_application_error_uses_server_message() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let err = assert_err!(client.get::<Value, _>("/app-error", &()).await);

    assert!(matches!(&err, ApiError::Application(msg) if msg == "Out of stock"));
    assert_eq!(err.to_string(), "Out of stock");
    assert_eq!(err.kind(), ErrorKind::Permanent);
}

#[tokio::test]
async fn test_application_error_without_message_falls_back() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let err = assert_err!(client.get::<Value, _>("/app-error-bare", &()).await);

    assert_eq!(err.to_string(), FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_http_error_ignores_body() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let err = assert_err!(client.get::<Value, _>("/server-error", &()).await);

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_not_found_is_http_error() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let err = assert_err!(client.get::<Value, _>("/products/missing", &()).await);

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let value: Value = assert_ok!(client.get("/empty", &()).await);

    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_missing_data_is_null() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let value: Value = assert_ok!(client.post("/no-data", &json!({})).await);

    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let err = assert_err!(client.get::<Value, _>("/not-json", &()).await);

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api");

    let err = assert_err!(client.get::<Value, _>("/categories", &()).await);

    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_dropped_connection_is_not_retried() {
    let base_url = spawn_hangup_upstream().await;
    let client = ApiClient::new(&base_url);

    let err = assert_err!(client.get::<Value, _>("/categories", &()).await);

    assert!(matches!(&err, ApiError::Transport(e) if !e.is_connect() && !e.is_timeout()));
    assert_eq!(err.kind(), ErrorKind::Permanent);
}

// == Timeouts ==

#[tokio::test]
async fn test_timeout_bounds_slow_upstream() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url).with_timeout(Duration::from_millis(50));

    let err = assert_err!(client.get::<String, _>("/slow", &()).await);

    assert!(matches!(&err, ApiError::Transport(e) if e.is_timeout()));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_timeout_keeps_injected_http_client() {
    let stub = spawn_upstream().await;
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_static("Bearer injected"),
    );
    let http = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap();
    let client = ApiClient::with_http_client(&stub.base_url, http)
        .with_timeout(Duration::from_secs(5));

    let auth: Option<String> = assert_ok!(client.get("/auth", &()).await);

    assert_eq!(auth.as_deref(), Some("Bearer injected"));
}

// == Query Strings and Headers ==

#[tokio::test]
async fn test_query_omits_none_values() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let query: String = assert_ok!(
        client
            .get("/echo-query", &json!({"limit": 5, "category": null}))
            .await
    );

    assert_eq!(query, "limit=5");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url).with_bearer_token("service-key");

    let auth: Option<String> = assert_ok!(client.get("/auth", &()).await);

    assert_eq!(auth.as_deref(), Some("Bearer service-key"));
}

#[tokio::test]
async fn test_no_auth_header_by_default() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url);

    let auth: Option<String> = assert_ok!(client.get("/auth", &()).await);

    assert!(auth.is_none());
}

// == Retry ==

#[tokio::test]
async fn test_retry_recovers_from_transient_failures() {
    let stub = spawn_upstream().await;
    stub.upstream.fail_next(2);
    let client = ApiClient::new(&stub.base_url)
        .with_retry_policy(RetryPolicy::exponential(3, Duration::from_millis(5)));

    let value: String = assert_ok!(client.get("/flaky", &()).await);

    assert_eq!(value, "recovered");
    assert_eq!(stub.upstream.hits("GET /flaky"), 3);
}

#[tokio::test]
async fn test_default_client_does_not_retry() {
    let stub = spawn_upstream().await;
    stub.upstream.fail_next(1);
    let client = ApiClient::new(&stub.base_url);

    let err = assert_err!(client.get::<String, _>("/flaky", &()).await);

    assert_eq!(err.status(), Some(503));
    assert_eq!(stub.upstream.hits("GET /flaky"), 1);
}

#[tokio::test]
async fn test_permanent_errors_are_not_retried() {
    let stub = spawn_upstream().await;
    let client = ApiClient::new(&stub.base_url)
        .with_retry_policy(RetryPolicy::exponential(3, Duration::from_millis(5)));

    assert_err!(client.get::<Value, _>("/products/missing", &()).await);

    assert_eq!(stub.upstream.hits("GET /products/:id"), 1);
}

// == Storefront Operations ==

fn storefront(base_url: &str) -> StorefrontApi {
    StorefrontApi::new(ApiClient::new(base_url), shared_cache(MemoryCache::new()))
}

#[tokio::test]
async fn test_reads_are_cached_within_ttl() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    let first = assert_ok!(api.get_products(Some(5), None).await);
    let second = assert_ok!(api.get_products(Some(5), None).await);

    assert_eq!(first, second);
    assert_eq!(stub.upstream.hits("GET /products"), 1);
    assert_eq!(first[0]["query"], "limit=5");
    assert!(api.cache().read().await.contains("products:5"));
}

#[tokio::test]
async fn test_distinct_filters_use_distinct_keys() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_products(None, None).await);
    assert_ok!(api.get_products(None, Some("c1")).await);
    assert_ok!(api.get_products(Some(2), Some("c1")).await);
    assert_ok!(api.get_featured_products().await);

    assert_eq!(stub.upstream.hits("GET /products"), 4);
    let cache = api.cache().read().await;
    for key in [
        "products:all",
        "products:category:c1",
        "products:category:c1:2",
        "products:featured",
    ] {
        assert!(cache.contains(key), "missing {key}");
    }
}

#[tokio::test]
async fn test_update_product_invalidates_then_refetches() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_product("7").await);
    assert_ok!(api.get_products(None, None).await);
    assert_ok!(api.get_categories().await);

    assert_ok!(api.update_product("7", &json!({"price": 10})).await);

    {
        let cache = api.cache().read().await;
        assert!(!cache.contains("product:7"));
        assert!(!cache.contains("products:all"));
        assert!(cache.contains("categories"));
    }

    assert_ok!(api.get_product("7").await);
    assert_eq!(stub.upstream.hits("GET /products/:id"), 2);
}

#[tokio::test]
async fn test_failed_write_keeps_cache() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_product("locked").await);
    let err = assert_err!(api.update_product("locked", &json!({"price": 1})).await);

    assert!(matches!(err, ApiError::Application(_)));
    assert!(api.cache().read().await.contains("product:locked"));
}

#[tokio::test]
async fn test_create_product_invalidates_lists() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_products(Some(10), None).await);
    let created = assert_ok!(api.create_product(&json!({"name": "Lamp"})).await);

    assert_eq!(created["id"], 99);
    assert!(api.cache().read().await.is_empty());
}

#[tokio::test]
async fn test_add_to_cart_sends_user_and_invalidates_own_cart() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_cart("alice").await);
    assert_ok!(api.get_cart("bob").await);
    assert_ok!(api.add_to_cart("alice", &json!({"productId": "1", "quantity": 2})).await);

    assert_eq!(
        stub.upstream.bodies(),
        vec![json!({"productId": "1", "quantity": 2, "userId": "alice"})]
    );
    let cache = api.cache().read().await;
    assert!(!cache.contains(keys::cart("alice").as_str()));
    assert!(cache.contains(keys::cart("bob").as_str()));
}

#[tokio::test]
async fn test_create_order_invalidates_orders_and_cart() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_cart("u1").await);
    api.cache()
        .write()
        .await
        .set(keys::orders("u1").as_str(), json!([]), 60);

    let order = assert_ok!(api.create_order("u1", &json!({"items": []})).await);

    assert_eq!(order["id"], "o1");
    assert!(api.cache().read().await.is_empty());
}

#[tokio::test]
async fn test_update_profile_invalidates_user_scope() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    assert_ok!(api.get_cart("u1").await);
    assert_ok!(api.update_profile("u1", &json!({"name": "Ada"})).await);

    assert!(!api.cache().read().await.contains("cart:u1"));
    assert_eq!(stub.upstream.hits("PUT /users/:id"), 1);
}

#[tokio::test]
async fn test_read_errors_propagate_and_are_not_cached() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    let err = assert_err!(api.get_product("missing").await);
    assert_eq!(err.status(), Some(404));
    assert_err!(api.get_product("missing").await);

    assert_eq!(stub.upstream.hits("GET /products/:id"), 2);
    assert!(api.cache().read().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_reads_share_one_fetch() {
    let stub = spawn_upstream().await;
    let api = storefront(&stub.base_url);

    let reads = (0..8).map(|_| {
        let api = api.clone();
        tokio::spawn(async move { api.get_categories().await })
    });
    for read in reads.collect::<Vec<_>>() {
        assert_ok!(read.await.unwrap());
    }

    assert_eq!(stub.upstream.hits("GET /categories"), 1);
    assert_eq!(api.in_flight(), 0);
}
