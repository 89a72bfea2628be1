use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Identity of a cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Full coupon list shown on the admin screen, newest first.
    AdminCoupons,
}

/// Notification sent to subscribers when a cached read goes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Invalidated(QueryKey),
}

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Read cache keyed by query identity.
///
/// Entries live until a mutation invalidates them; there is no time-based
/// expiry. Invalidation is broadcast so listeners can refetch.
///
/// Every invalidation bumps a generation counter. A reader takes the
/// generation before going to the store and hands it back to [`insert`];
/// if an invalidation happened in between, the result is discarded.
///
/// [`insert`]: QueryCache::insert
pub struct QueryCache<V> {
    inner: Mutex<CacheInner<V>>,
    events: broadcast::Sender<CacheEvent>,
}

struct CacheInner<V> {
    entries: HashMap<QueryKey, CacheEntry<V>>,
    generation: u64,
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                generation: 0,
            }),
            events,
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<V> {
        let inner = self.inner.lock().ok()?;
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// When the cached value for `key` was read from the store.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        let inner = self.inner.lock().ok()?;
        inner.entries.get(key).map(|entry| entry.fetched_at)
    }

    /// Current generation; take it before reading from the store.
    pub fn generation(&self) -> u64 {
        self.inner.lock().map(|inner| inner.generation).unwrap_or(0)
    }

    /// Store `value` read at `generation`. Returns `false`, storing nothing,
    /// when the cache was invalidated since.
    pub fn insert(&self, key: QueryKey, value: V, generation: u64) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.generation != generation {
            return false;
        }
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Utc::now(),
            },
        );
        true
    }

    /// Drop the entry for `key` and tell subscribers. Returns whether an
    /// entry was present.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self
            .inner
            .lock()
            .map(|mut inner| {
                inner.generation += 1;
                inner.entries.remove(key).is_some()
            })
            .unwrap_or(false);

        // Nobody listening is fine.
        let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
        removed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
