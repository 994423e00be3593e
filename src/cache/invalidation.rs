//! Cache invalidation registry.
//!
//! One function per entity type. Each deletes its hand-listed keys and then
//! walks the tag index, so derived keys created by newer read paths are
//! evicted as well.

use serde::Serialize;
use tracing::info;

use crate::cache::{keys, Entity, SharedCache, Tag};

/// Outcome of an invalidation call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvalidationResult {
    /// Number of entries removed.
    pub count: usize,
    /// Keys that were removed.
    pub keys: Vec<String>,
}

impl InvalidationResult {
    fn merge(&mut self, keys: Vec<String>) {
        for key in keys {
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
        self.count = self.keys.len();
    }
}

/// Named invalidation functions over a shared cache.
#[derive(Clone)]
pub struct CacheInvalidation {
    cache: SharedCache,
}

impl CacheInvalidation {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    /// Product write: the product, every product list, its reviews.
    pub async fn invalidate_product(&self, id: &str) -> InvalidationResult {
        self.run(
            "product",
            &[
                keys::product(id),
                keys::products(None),
                keys::featured_products(),
                keys::reviews(id),
            ],
            &[
                Tag::item(Entity::Product, id),
                Tag::collection(Entity::Product),
            ],
        )
        .await
    }

    /// Category write: category listings and the category's product list.
    pub async fn invalidate_category(&self, id: &str) -> InvalidationResult {
        self.run(
            "category",
            &[
                keys::categories(),
                keys::category(id),
                keys::products_by_category(id, None),
            ],
            &[
                Tag::item(Entity::Category, id),
                Tag::collection(Entity::Category),
            ],
        )
        .await
    }

    /// User write: profile plus every user-scoped key.
    pub async fn invalidate_user(&self, user_id: &str) -> InvalidationResult {
        self.run(
            "user",
            &[
                keys::user(user_id),
                keys::cart(user_id),
                keys::orders(user_id),
                keys::addresses(user_id),
            ],
            &[Tag::item(Entity::User, user_id)],
        )
        .await
    }

    /// Cart write for the acting user.
    pub async fn invalidate_cart(&self, user_id: &str) -> InvalidationResult {
        self.run(
            "cart",
            &[keys::cart(user_id)],
            &[Tag::item(Entity::Cart, user_id)],
        )
        .await
    }

    /// Order write: the user's order list and, when known, the order itself.
    pub async fn invalidate_orders(
        &self,
        user_id: &str,
        order_id: Option<&str>,
    ) -> InvalidationResult {
        let mut targets = vec![keys::orders(user_id)];
        if let Some(order_id) = order_id {
            targets.push(keys::order(order_id));
        }
        self.run("orders", &targets, &[Tag::item(Entity::Order, user_id)])
            .await
    }

    /// Review write: the product's reviews and the product (rating).
    pub async fn invalidate_reviews(&self, product_id: &str) -> InvalidationResult {
        self.run(
            "reviews",
            &[keys::reviews(product_id), keys::product(product_id)],
            &[Tag::item(Entity::Review, product_id)],
        )
        .await
    }

    /// Service write: the service listing and optionally one service.
    pub async fn invalidate_services(&self, id: Option<&str>) -> InvalidationResult {
        let mut targets = vec![keys::services()];
        if let Some(id) = id {
            targets.push(keys::service(id));
        }
        self.run("services", &targets, &[Tag::collection(Entity::Service)])
            .await
    }

    /// Address write for the acting user.
    pub async fn invalidate_addresses(&self, user_id: &str) -> InvalidationResult {
        self.run(
            "addresses",
            &[keys::addresses(user_id)],
            &[Tag::item(Entity::Address, user_id)],
        )
        .await
    }

    /// Dispatches on an entity name, as used by the admin endpoint.
    pub async fn invalidate_entity(&self, entity: Entity, id: Option<&str>) -> InvalidationResult {
        match (entity, id) {
            (Entity::Product, Some(id)) => self.invalidate_product(id).await,
            (Entity::Category, Some(id)) => self.invalidate_category(id).await,
            (Entity::User, Some(id)) => self.invalidate_user(id).await,
            (Entity::Cart, Some(id)) => self.invalidate_cart(id).await,
            (Entity::Order, Some(id)) => self.invalidate_orders(id, None).await,
            (Entity::Review, Some(id)) => self.invalidate_reviews(id).await,
            (Entity::Address, Some(id)) => self.invalidate_addresses(id).await,
            (Entity::Service, id) => self.invalidate_services(id).await,
            (entity, None) => self.invalidate_tag(&Tag::collection(entity)).await,
        }
    }

    /// Removes every key registered under `tag`.
    pub async fn invalidate_tag(&self, tag: &Tag) -> InvalidationResult {
        let mut result = InvalidationResult::default();
        result.merge(self.cache.write().await.invalidate_tag(tag));
        info!(tag = %tag, count = result.count, "Cache entries invalidated by tag");
        result
    }

    /// Drops the whole cache.
    pub async fn invalidate_all(&self) -> InvalidationResult {
        let mut cache = self.cache.write().await;
        let keys = cache.keys();
        cache.clear();
        info!(count = keys.len(), "All cache entries invalidated");
        InvalidationResult {
            count: keys.len(),
            keys,
        }
    }

    async fn run(&self, scope: &str, targets: &[keys::CacheKey], tags: &[Tag]) -> InvalidationResult {
        let mut result = InvalidationResult::default();
        {
            let mut cache = self.cache.write().await;
            let deleted: Vec<String> = targets
                .iter()
                .map(|key| key.as_str())
                .filter(|key| cache.delete(key))
                .map(str::to_string)
                .collect();
            result.merge(deleted);
            for tag in tags {
                result.merge(cache.invalidate_tag(tag));
            }
        }

        info!(
            scope = %scope,
            count = result.count,
            keys = ?result.keys,
            "Cache entries invalidated"
        );
        result
    }
}
