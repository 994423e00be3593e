//! Read-through caching with in-flight deduplication.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::cache::{CacheKey, SharedCache};

type InFlight = Arc<Mutex<HashMap<String, Flight>>>;

/// A leader's slot: waiters subscribe to `notify`.
struct Flight {
    notify: Arc<Notify>,
    /// Cache generation the leader observed on its miss
    generation: u64,
}

// == Read Through Cache ==
/// Wraps a shared [`MemoryCache`](crate::cache::MemoryCache) with
/// `with_cache`, the read-through entry point used by every read path.
///
/// Concurrent misses on the same key run the fetcher once: the first caller
/// fetches, the others wait and then read what it stored. A fetch that was
/// overtaken by an invalidation is neither stored nor joined.
#[derive(Clone)]
pub struct ReadThroughCache {
    cache: SharedCache,
    in_flight: InFlight,
}

impl ReadThroughCache {
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The underlying shared cache.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == With Cache ==
    /// Returns the cached value for `key`, or runs `fetcher` and caches its
    /// result for `ttl_seconds`.
    ///
    /// Fetcher errors are returned unchanged and nothing is cached. Waiters
    /// on a failed or cancelled fetch retry the lookup and may fetch
    /// themselves.
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        key: impl Into<CacheKey>,
        ttl_seconds: u64,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.into();

        let (_leader, generation) = loop {
            let (hit, generation) = self.lookup::<T>(key.as_str()).await;
            if let Some(hit) = hit {
                return Ok(hit);
            }

            let leader: Arc<Notify>;
            let notified;
            {
                let mut in_flight = self.lock_in_flight();
                let current = in_flight
                    .get(key.as_str())
                    .filter(|flight| flight.generation >= generation)
                    .map(|flight| Arc::clone(&flight.notify));
                match current {
                    Some(notify) => leader = notify,
                    None => {
                        let notify = Arc::new(Notify::new());
                        let flight = Flight {
                            notify: Arc::clone(&notify),
                            generation,
                        };
                        if in_flight.insert(key.as_str().to_string(), flight).is_some() {
                            debug!(key = %key, "in-flight fetch predates an invalidation, fetching again");
                        }
                        break (
                            InFlightGuard {
                                key: key.as_str().to_string(),
                                notify,
                                in_flight: Arc::clone(&self.in_flight),
                            },
                            generation,
                        );
                    }
                }
                // Registered before the lock is released, so the leader's
                // wake-up cannot be missed.
                notified = leader.notified();
            }

            debug!(key = %key, "fetch already in flight, waiting");
            notified.await;
        };

        debug!(key = %key, "cache miss, fetching");
        let value = fetcher().await?;

        match serde_json::to_value(&value) {
            Ok(json) => {
                let (name, tags) = key.into_parts();
                let stored = self
                    .cache
                    .write()
                    .await
                    .set_tagged_if_current(name.as_str(), json, ttl_seconds, tags, generation);
                if !stored {
                    debug!(key = %name, "cache invalidated during fetch, result not stored");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "value not serialisable, skipping cache"),
        }

        Ok(value)
    }

    /// Reads `key` and the cache generation under one lock.
    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> (Option<T>, u64) {
        let (cached, generation) = {
            let mut cache = self.cache.write().await;
            (cache.get(key), cache.generation())
        };
        let Some(cached) = cached else {
            return (None, generation);
        };
        match serde_json::from_value(cached) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                (Some(value), generation)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cached value has unexpected shape, refetching");
                (None, generation)
            }
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, Flight>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of keys currently being fetched.
    pub fn in_flight_len(&self) -> usize {
        self.lock_in_flight().len()
    }
}
/// Releases a key's in-flight slot and wakes its waiters, including when the
/// leading fetch is dropped mid-await.
struct InFlightGuard {
    key: String,
    notify: Arc<Notify>,
    in_flight: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(current) = in_flight.get(&self.key) {
            if Arc::ptr_eq(&current.notify, &self.notify) {
                in_flight.remove(&self.key);
            }
        }
        drop(in_flight);
        self.notify.notify_waiters();
    }
}
