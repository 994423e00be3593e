//! Memory Cache Module
//!
//! Process-local key/entry map with per-entry TTL and a dependency tag index.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Tag, TagIndex};

// == Memory Cache ==
/// Key/value storage with lazy TTL expiry.
///
/// There is no capacity bound: entries leave the map only through `delete`,
/// `clear`, tag invalidation, an expired read, or a `cleanup` sweep.
/// None of the operations fail; absence is `None`.
#[derive(Debug)]
pub struct MemoryCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    tags: TagIndex,
    stats: CacheStats,
    generation: u64,
}

impl<T: Clone> MemoryCache<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            tags: TagIndex::new(),
            stats: CacheStats::new(),
            generation: 0,
        }
    }

    // == Set ==
    /// Stores `data` under `key`, stamped with the current time.
    ///
    /// Overwriting a key resets its timestamp and drops its previous tags.
    pub fn set(&mut self, key: impl Into<String>, data: T, ttl_seconds: u64) {
        self.insert(key.into(), CacheEntry::new(data, ttl_seconds));
    }

    // == Set Tagged ==
    /// Stores `data` under `key` and registers it under each of `tags`.
    pub fn set_tagged(&mut self, key: impl Into<String>, data: T, ttl_seconds: u64, tags: Vec<Tag>) {
        self.insert(key.into(), CacheEntry::new(data, ttl_seconds).with_tags(tags));
    }

    /// Inserts a prepared entry.
    pub fn insert(&mut self, key: String, entry: CacheEntry<T>) {
        self.tags.register(&key, &entry.tags);
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            let stale: Vec<Tag> = previous
                .tags
                .into_iter()
                .filter(|tag| !self.entries[&key].tags.contains(tag))
                .collect();
            self.tags.unregister(&key, &stale);
        }
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns a clone of the data under `key` if present and fresh.
    ///
    /// Expired entries are removed on read and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                return Some(entry.data.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            debug!(key = %key, "cache entry expired on read");
        }
        self.stats.record_miss();
        None
    }

    // == Delete ==
    /// Removes `key`, returning whether an entry was present.
    ///
    /// Advances the generation even when `key` is absent, so a fill of
    /// `key` that is still running cannot land afterwards.
    pub fn delete(&mut self, key: &str) -> bool {
        self.generation += 1;
        let removed = self.remove_entry(key);
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    // == Invalidate Tag ==
    /// Removes every key registered under `tag` and returns them.
    pub fn invalidate_tag(&mut self, tag: &Tag) -> Vec<String> {
        self.generation += 1;
        let keys = self.tags.keys_for(tag);
        let removed: Vec<String> = keys
            .into_iter()
            .filter(|key| self.remove_entry(key))
            .collect();
        self.stats.record_invalidations(removed.len());
        removed
    }

    // == Clear ==
    /// Removes every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        self.generation += 1;
        let count = self.entries.len();
        self.entries.clear();
        self.tags.clear();
        self.stats.record_invalidations(count);
        self.stats.set_total_entries(0);
        count
    }

    // == Generation ==
    /// Counter advanced by every explicit removal (`delete`, tag
    /// invalidation, `clear`). Expiry does not advance it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores like [`set_tagged`](Self::set_tagged) only if no explicit
    /// removal happened since `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub fn set_tagged_if_current(
        &mut self,
        key: impl Into<String>,
        data: T,
        ttl_seconds: u64,
        tags: Vec<Tag>,
        generation: u64,
    ) -> bool {
        if self.generation != generation {
            return false;
        }
        self.set_tagged(key, data, ttl_seconds, tags);
        true
    }

    // == Cleanup ==
    /// Sweeps the map and removes every expired entry.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    // == Contains ==
    /// Checks for a fresh entry without touching the statistics.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Keys ==
    /// Returns every stored key, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.tags.unregister(key, &entry.tags);
                self.stats.set_total_entries(self.entries.len());
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
