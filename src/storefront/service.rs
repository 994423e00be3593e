//! Storefront API service.
//!
//! Reads go through [`ReadThroughCache::with_cache`] under tagged keys.
//! Writes hit the upstream first and invalidate only after it succeeds, so a
//! failed write leaves the cache as it was.

use serde::Serialize;
use serde_json::{json, Value};

use crate::cache::{
    keys, CacheInvalidation, Entity, InvalidationResult, ReadThroughCache, SharedCache, Tag,
};
use crate::client::{ApiClient, Result};

/// Entity payloads are passed through as JSON.
pub type Record = Value;

#[derive(Serialize)]
struct ProductQuery<'a> {
    limit: Option<u32>,
    category: Option<&'a str>,
    featured: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewQuery<'a> {
    product_id: &'a str,
}

/// Reads the `id` of a record, accepting string or numeric ids.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Returns `body` with `field` set to `value`, wrapping non-objects.
fn with_field(body: &Record, field: &str, value: &str) -> Record {
    let mut body = match body {
        Value::Object(_) => body.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    if let Value::Object(map) = &mut body {
        map.insert(field.to_string(), Value::String(value.to_string()));
    }
    body
}

// == Storefront Api ==
#[derive(Clone)]
pub struct StorefrontApi {
    client: ApiClient,
    cache: ReadThroughCache,
    invalidation: CacheInvalidation,
}

impl StorefrontApi {
    pub fn new(client: ApiClient, cache: SharedCache) -> Self {
        Self {
            client,
            cache: ReadThroughCache::new(cache.clone()),
            invalidation: CacheInvalidation::new(cache),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        self.cache.cache()
    }

    pub fn invalidation(&self) -> &CacheInvalidation {
        &self.invalidation
    }

    /// Number of keys currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.cache.in_flight_len()
    }

    // == Product Reads ==
    pub async fn get_products(&self, limit: Option<u32>, category: Option<&str>) -> Result<Vec<Record>> {
        let key = match category {
            Some(category) => keys::products_by_category(category, limit),
            None => keys::products(limit),
        };
        let client = &self.client;
        self.cache
            .with_cache(key, keys::PRODUCTS_TTL, || async move {
                client
                    .get(
                        "/products",
                        &ProductQuery {
                            limit,
                            category,
                            featured: None,
                        },
                    )
                    .await
            })
            .await
    }

    pub async fn get_featured_products(&self) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::featured_products(), keys::PRODUCTS_TTL, || async move {
                client
                    .get(
                        "/products",
                        &ProductQuery {
                            limit: None,
                            category: None,
                            featured: Some(true),
                        },
                    )
                    .await
            })
            .await
    }

    pub async fn get_product(&self, id: &str) -> Result<Record> {
        let client = &self.client;
        let path = format!("/products/{id}");
        self.cache
            .with_cache(keys::product(id), keys::PRODUCT_TTL, || async move {
                client.get(&path, &()).await
            })
            .await
    }

    pub async fn get_categories(&self) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::categories(), keys::CATEGORIES_TTL, || async move {
                client.get("/categories", &()).await
            })
            .await
    }

    pub async fn get_product_reviews(&self, product_id: &str) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::reviews(product_id), keys::REVIEWS_TTL, || async move {
                client.get("/reviews", &ReviewQuery { product_id }).await
            })
            .await
    }

    // == User Scoped Reads ==
    pub async fn get_cart(&self, user_id: &str) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::cart(user_id), keys::CART_TTL, || async move {
                client.get("/cart", &UserQuery { user_id }).await
            })
            .await
    }

    pub async fn get_orders(&self, user_id: &str) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::orders(user_id), keys::ORDERS_TTL, || async move {
                client.get("/orders", &UserQuery { user_id }).await
            })
            .await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Record> {
        let client = &self.client;
        let path = format!("/orders/{order_id}");
        self.cache
            .with_cache(keys::order(order_id), keys::ORDERS_TTL, || async move {
                client.get(&path, &()).await
            })
            .await
    }

    pub async fn get_addresses(&self, user_id: &str) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::addresses(user_id), keys::ADDRESSES_TTL, || async move {
                client.get("/addresses", &UserQuery { user_id }).await
            })
            .await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Record> {
        let client = &self.client;
        let path = format!("/users/{user_id}");
        self.cache
            .with_cache(keys::user(user_id), keys::USER_TTL, || async move {
                client.get(&path, &()).await
            })
            .await
    }

    pub async fn get_services(&self) -> Result<Vec<Record>> {
        let client = &self.client;
        self.cache
            .with_cache(keys::services(), keys::SERVICES_TTL, || async move {
                client.get("/services", &()).await
            })
            .await
    }

    // == Product Writes ==
    pub async fn create_product(&self, product: &Record) -> Result<Record> {
        let created: Record = self.client.post("/products", product).await?;
        match record_id(&created) {
            Some(id) => self.invalidation.invalidate_product(&id).await,
            None => {
                self.invalidation
                    .invalidate_tag(&Tag::collection(Entity::Product))
                    .await
            }
        };
        Ok(created)
    }

    pub async fn update_product(&self, id: &str, changes: &Record) -> Result<Record> {
        let updated = self.client.put(&format!("/products/{id}"), changes).await?;
        self.invalidation.invalidate_product(id).await;
        Ok(updated)
    }

    pub async fn delete_product(&self, id: &str) -> Result<Record> {
        let deleted = self.client.delete(&format!("/products/{id}"), &()).await?;
        self.invalidation.invalidate_product(id).await;
        Ok(deleted)
    }

    // == Category Writes ==
    pub async fn create_category(&self, category: &Record) -> Result<Record> {
        let created: Record = self.client.post("/categories", category).await?;
        self.invalidate_category_of(&created).await;
        Ok(created)
    }

    pub async fn update_category(&self, id: &str, changes: &Record) -> Result<Record> {
        let updated = self.client.put(&format!("/categories/{id}"), changes).await?;
        self.invalidation.invalidate_category(id).await;
        Ok(updated)
    }

    async fn invalidate_category_of(&self, category: &Record) -> InvalidationResult {
        match record_id(category) {
            Some(id) => self.invalidation.invalidate_category(&id).await,
            None => self.invalidation.invalidate_entity(Entity::Category, None).await,
        }
    }

    // == Cart Writes ==
    pub async fn add_to_cart(&self, user_id: &str, item: &Record) -> Result<Record> {
        let added = self
            .client
            .post("/cart", &with_field(item, "userId", user_id))
            .await?;
        self.invalidation.invalidate_cart(user_id).await;
        Ok(added)
    }

    pub async fn update_cart_item(&self, user_id: &str, item_id: &str, changes: &Record) -> Result<Record> {
        let updated = self
            .client
            .put(&format!("/cart/{item_id}"), &with_field(changes, "userId", user_id))
            .await?;
        self.invalidation.invalidate_cart(user_id).await;
        Ok(updated)
    }

    pub async fn remove_cart_item(&self, user_id: &str, item_id: &str) -> Result<Record> {
        let removed = self
            .client
            .delete(&format!("/cart/{item_id}"), &UserQuery { user_id })
            .await?;
        self.invalidation.invalidate_cart(user_id).await;
        Ok(removed)
    }

    pub async fn clear_cart(&self, user_id: &str) -> Result<Record> {
        let cleared = self.client.delete("/cart", &UserQuery { user_id }).await?;
        self.invalidation.invalidate_cart(user_id).await;
        Ok(cleared)
    }

    // == Order Writes ==
    /// Places an order; checkout also empties the user's cart upstream.
    pub async fn create_order(&self, user_id: &str, order: &Record) -> Result<Record> {
        let created: Record = self
            .client
            .post("/orders", &with_field(order, "userId", user_id))
            .await?;
        let order_id = record_id(&created);
        self.invalidation
            .invalidate_orders(user_id, order_id.as_deref())
            .await;
        self.invalidation.invalidate_cart(user_id).await;
        Ok(created)
    }

    pub async fn update_order_status(&self, user_id: &str, order_id: &str, status: &str) -> Result<Record> {
        let updated = self
            .client
            .put(&format!("/orders/{order_id}"), &json!({ "status": status }))
            .await?;
        self.invalidation
            .invalidate_orders(user_id, Some(order_id))
            .await;
        Ok(updated)
    }

    // == Review Writes ==
    pub async fn create_review(&self, user_id: &str, product_id: &str, review: &Record) -> Result<Record> {
        let body = with_field(&with_field(review, "userId", user_id), "productId", product_id);
        let created = self.client.post("/reviews", &body).await?;
        self.invalidation.invalidate_reviews(product_id).await;
        Ok(created)
    }

    // == Account Writes ==
    pub async fn create_address(&self, user_id: &str, address: &Record) -> Result<Record> {
        let created = self
            .client
            .post("/addresses", &with_field(address, "userId", user_id))
            .await?;
        self.invalidation.invalidate_addresses(user_id).await;
        Ok(created)
    }

    pub async fn update_profile(&self, user_id: &str, changes: &Record) -> Result<Record> {
        let updated = self.client.put(&format!("/users/{user_id}"), changes).await?;
        self.invalidation.invalidate_user(user_id).await;
        Ok(updated)
    }

    // == Service Bookings ==
    pub async fn create_booking(&self, user_id: &str, service_id: &str, booking: &Record) -> Result<Record> {
        let created = self
            .client
            .post(
                &format!("/services/{service_id}/bookings"),
                &with_field(booking, "userId", user_id),
            )
            .await?;
        self.invalidation.invalidate_services(Some(service_id)).await;
        Ok(created)
    }
}
