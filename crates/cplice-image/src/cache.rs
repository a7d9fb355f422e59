//! Read-through memoization for registry responses
//!
//! Each key owns a `OnceCell` slot, so concurrent lookups of the same key
//! collapse onto one fetch. Entries are never evicted. Once `capacity` keys
//! hold slots, new keys are fetched but not retained.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

pub struct MemoCache<K, V> {
    name: &'static str,
    capacity: usize,
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, running `init` if it has none yet
    ///
    /// A failed `init` releases the key's slot; the next caller tries again.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(slot) => Some(slot.clone()),
                None if slots.len() < self.capacity => {
                    let slot = Arc::new(OnceCell::new());
                    slots.insert(key, slot.clone());
                    Some(slot)
                }
                None => {
                    debug!(
                        cache = self.name,
                        "Cache full ({} entries); not retaining {:?}", self.capacity, key
                    );
                    None
                }
            }
        };

        let Some(slot) = slot else {
            return init().await;
        };

        let result = slot.get_or_try_init(init).await.cloned();
        if result.is_err() {
            // Empty slots must not hold capacity
            self.slots
                .lock()
                .await
                .retain(|_, s| !Arc::ptr_eq(s, &slot) || s.initialized());
        }
        result
    }

    /// Whether a populated entry exists for `key`
    pub async fn contains(&self, key: &K) -> bool {
        self.slots
            .lock()
            .await
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of populated entries
    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
