//! Cache key builders.
//!
//! Every key is a pure function of entity identifiers. Builders also attach
//! the dependency tags the key derives from, so tag invalidation reaches
//! keys that no hand-written list mentions.

use std::fmt;

use crate::cache::{Entity, Tag};

// == TTLs (seconds) ==
pub const PRODUCTS_TTL: u64 = 300;
pub const PRODUCT_TTL: u64 = 600;
pub const CATEGORIES_TTL: u64 = 1800;
pub const REVIEWS_TTL: u64 = 120;
pub const CART_TTL: u64 = 30;
pub const ORDERS_TTL: u64 = 60;
pub const SERVICES_TTL: u64 = 900;
pub const ADDRESSES_TTL: u64 = 300;
pub const USER_TTL: u64 = 300;

// == Cache Key ==
/// A cache key string together with the tags its value depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    key: String,
    tags: Vec<Tag>,
}

impl CacheKey {
    /// Key without dependency tags.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tags: Vec::new(),
        }
    }

    pub fn tagged(key: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            key: key.into(),
            tags,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn into_parts(self) -> (String, Vec<Tag>) {
        (self.key, self.tags)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

// == Product Keys ==
/// `product:{id}`
pub fn product(id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("product:{id}"),
        vec![Tag::item(Entity::Product, id)],
    )
}

/// `products:{limit}` or `products:all`
pub fn products(limit: Option<u32>) -> CacheKey {
    let suffix = limit.map_or_else(|| "all".to_string(), |l| l.to_string());
    CacheKey::tagged(
        format!("products:{suffix}"),
        vec![Tag::collection(Entity::Product)],
    )
}

/// `products:featured`
pub fn featured_products() -> CacheKey {
    CacheKey::tagged(
        "products:featured",
        vec![Tag::collection(Entity::Product)],
    )
}

/// `products:category:{category_id}`, or `...:{limit}` when limited
pub fn products_by_category(category_id: &str, limit: Option<u32>) -> CacheKey {
    let key = match limit {
        Some(limit) => format!("products:category:{category_id}:{limit}"),
        None => format!("products:category:{category_id}"),
    };
    CacheKey::tagged(
        key,
        vec![
            Tag::collection(Entity::Product),
            Tag::item(Entity::Category, category_id),
        ],
    )
}

// == Category Keys ==
/// `categories`
pub fn categories() -> CacheKey {
    CacheKey::tagged("categories", vec![Tag::collection(Entity::Category)])
}

/// `category:{id}`
pub fn category(id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("category:{id}"),
        vec![Tag::item(Entity::Category, id)],
    )
}

// == Review Keys ==
/// `reviews:{product_id}`
pub fn reviews(product_id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("reviews:{product_id}"),
        vec![
            Tag::item(Entity::Review, product_id),
            Tag::item(Entity::Product, product_id),
        ],
    )
}

// == User Scoped Keys ==
/// `user:{user_id}`
pub fn user(user_id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("user:{user_id}"),
        vec![Tag::item(Entity::User, user_id)],
    )
}

/// `cart:{user_id}`
pub fn cart(user_id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("cart:{user_id}"),
        vec![
            Tag::item(Entity::Cart, user_id),
            Tag::item(Entity::User, user_id),
        ],
    )
}

/// `orders:{user_id}`
pub fn orders(user_id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("orders:{user_id}"),
        vec![
            Tag::item(Entity::Order, user_id),
            Tag::item(Entity::User, user_id),
        ],
    )
}

/// `order:{order_id}`
pub fn order(order_id: &str) -> CacheKey {
    CacheKey::new(format!("order:{order_id}"))
}

/// `addresses:{user_id}`
pub fn addresses(user_id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("addresses:{user_id}"),
        vec![
            Tag::item(Entity::Address, user_id),
            Tag::item(Entity::User, user_id),
        ],
    )
}

// == Service Keys ==
/// `services`
pub fn services() -> CacheKey {
    CacheKey::tagged("services", vec![Tag::collection(Entity::Service)])
}

/// `service:{id}`
pub fn service(id: &str) -> CacheKey {
    CacheKey::tagged(
        format!("service:{id}"),
        vec![
            Tag::item(Entity::Service, id),
            Tag::collection(Entity::Service),
        ],
    )
}
