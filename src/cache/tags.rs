//! Dependency Tag Module
//!
//! Tracks which cache keys derive from which entities so a write to an
//! entity can evict every derived key without a hand-written key list.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// == Entity ==
/// Entity types whose changes drive invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Product,
    Category,
    User,
    Cart,
    Order,
    Review,
    Service,
    Address,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Product => "product",
            Entity::Category => "category",
            Entity::User => "user",
            Entity::Cart => "cart",
            Entity::Order => "order",
            Entity::Review => "review",
            Entity::Service => "service",
            Entity::Address => "address",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Tag ==
/// A dependency recorded with a cache entry.
///
/// `id == None` marks a collection-level dependency, e.g. every product list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    entity: Entity,
    id: Option<String>,
}

impl Tag {
    /// Tag for a single entity instance.
    pub fn item(entity: Entity, id: impl Into<String>) -> Self {
        Self {
            entity,
            id: Some(id.into()),
        }
    }

    /// Tag for any collection of the given entity.
    pub fn collection(entity: Entity) -> Self {
        Self { entity, id: None }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}#{}", self.entity, id),
            None => write!(f, "{}#*", self.entity),
        }
    }
}

// == Tag Index ==
/// Maps each tag to the set of keys registered under it.
#[derive(Debug, Default)]
pub struct TagIndex {
    keys_by_tag: HashMap<Tag, HashSet<String>>,
}

impl TagIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Records `key` under each of `tags`.
    pub fn register(&mut self, key: &str, tags: &[Tag]) {
        for tag in tags {
            self.keys_by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    // == Unregister ==
    /// Forgets `key` under each of `tags`, dropping tags left empty.
    pub fn unregister(&mut self, key: &str, tags: &[Tag]) {
        for tag in tags {
            if let Some(keys) = self.keys_by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.keys_by_tag.remove(tag);
                }
            }
        }
    }

    // == Keys For ==
    /// Returns the keys currently registered under `tag`.
    pub fn keys_for(&self, tag: &Tag) -> Vec<String> {
        self.keys_by_tag
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.keys_by_tag.clear();
    }

    /// Number of distinct tags tracked.
    pub fn len(&self) -> usize {
        self.keys_by_tag.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.keys_by_tag.is_empty()
    }
}
