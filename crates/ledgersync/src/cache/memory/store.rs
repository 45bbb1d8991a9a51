//! In-memory cache store with LRU eviction.
//!
//! Entries live in an `LruCache` behind a `std::sync::Mutex`. The lock is
//! held only for the duration of a call, so no store operation spans an
//! `.await`. Entries past the retention window are dropped lazily on access
//! and by [`CacheStore::evict_expired`].
//!
//! Each key also carries a write generation that outlives its entry, so a
//! fetch started before an eviction still sees later writes.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::sync::broadcast;

use ledgersync_core::cache::{
    CacheEntry, CacheEvent, CacheStore, CachedValue, Collection, QueryKey, Snapshot,
};

/// Channel capacity for cache events.
const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug)]
struct Inner {
    entries: LruCache<QueryKey, CacheEntry>,
    generations: HashMap<QueryKey, u64>,
}

impl Inner {
    fn bump(&mut self, key: QueryKey) {
        *self.generations.entry(key).or_insert(0) += 1;
    }

    fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }

    /// Inserts a fresh entry, returning the key evicted to make room.
    fn insert(&mut self, key: QueryKey, value: CachedValue) -> Option<QueryKey> {
        self.bump(key);
        match self.entries.push(key, CacheEntry::new(value)) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }
}

/// In-memory cache store.
///
/// Cloning shares the underlying store and event channel.
#[derive(Debug, Clone)]
pub struct MemoryCacheStore {
    inner: Arc<Mutex<Inner>>,
    retention: Duration,
    events: broadcast::Sender<CacheEvent>,
}

impl MemoryCacheStore {
    /// Creates a store holding at most `max_entries` keys.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(max_entries: usize, retention: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(capacity),
                generations: HashMap::new(),
            })),
            retention,
            events,
        }
    }

    /// Number of keys currently held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, events: Vec<CacheEvent>) {
        for event in events {
            // No receivers is fine
            let _ = self.events.send(event);
        }
    }

    fn publish_set(&self, key: QueryKey, evicted: Option<QueryKey>) {
        let mut events = vec![CacheEvent::Updated(key)];
        if let Some(evicted) = evicted {
            tracing::trace!(key = %evicted, "Evicted least recently used cache entry");
            events.push(CacheEvent::Removed(evicted));
        }
        self.publish(events);
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        let mut inner = self.lock();

        match inner.entries.get(key) {
            Some(entry) if entry.is_expired(self.retention) => {
                inner.entries.pop(key);
                drop(inner);
                tracing::trace!(%key, "Evicted expired cache entry");
                self.publish(vec![CacheEvent::Removed(*key)]);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }

    fn set(&self, key: QueryKey, value: CachedValue) {
        let evicted = self.lock().insert(key, value);
        self.publish_set(key, evicted);
    }

    fn generation(&self, key: &QueryKey) -> u64 {
        self.lock().generation(key)
    }

    fn set_if_unchanged(&self, key: QueryKey, value: CachedValue, generation: u64) -> bool {
        let evicted = {
            let mut inner = self.lock();
            if inner.generation(&key) != generation {
                return false;
            }
            inner.insert(key, value)
        };
        self.publish_set(key, evicted);
        true
    }

    fn patch(&self, key: &QueryKey, patch: &mut dyn FnMut(&mut CachedValue)) -> bool {
        {
            let mut inner = self.lock();
            inner.bump(*key);
            match inner.entries.peek_mut(key) {
                Some(entry) if !entry.is_expired(self.retention) => patch(&mut entry.value),
                _ => return false,
            }
        }
        self.publish(vec![CacheEvent::Updated(*key)]);
        true
    }

    fn snapshot_keys(&self, keys: &[QueryKey]) -> Snapshot {
        let inner = self.lock();
        let mut snapshot = Snapshot::new();
        for key in keys {
            let entry = inner
                .entries
                .peek(key)
                .filter(|entry| !entry.is_expired(self.retention))
                .cloned();
            snapshot.push(*key, entry);
        }
        snapshot
    }

    fn restore(&self, snapshot: Snapshot) {
        let mut events = Vec::with_capacity(snapshot.len());
        {
            let mut inner = self.lock();
            for (key, entry) in snapshot {
                inner.bump(key);
                match entry {
                    Some(mut entry) => {
                        // A settle since the capture keeps its invalidation
                        if inner.entries.peek(&key).is_some_and(|current| current.invalidated) {
                            entry.invalidated = true;
                        }
                        inner.entries.put(key, entry);
                        events.push(CacheEvent::Updated(key));
                    }
                    None => {
                        if inner.entries.pop(&key).is_some() {
                            events.push(CacheEvent::Removed(key));
                        }
                    }
                }
            }
        }
        self.publish(events);
    }

    fn invalidate_keys(&self, keys: &[QueryKey]) {
        let mut events = Vec::with_capacity(keys.len());
        {
            let mut inner = self.lock();
            for key in keys {
                inner.bump(*key);
                if let Some(entry) = inner.entries.peek_mut(key) {
                    entry.invalidated = true;
                    events.push(CacheEvent::Invalidated(*key));
                }
            }
        }
        self.publish(events);
    }

    fn keys(&self, collection: Collection) -> Vec<QueryKey> {
        self.lock()
            .entries
            .iter()
            .filter(|(key, entry)| {
                key.collection() == collection && !entry.is_expired(self.retention)
            })
            .map(|(key, _)| *key)
            .collect()
    }

    fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn evict_expired(&self) -> usize {
        let expired: Vec<QueryKey> = {
            let mut inner = self.lock();
            let expired: Vec<QueryKey> = inner
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(self.retention))
                .map(|(key, _)| *key)
                .collect();
            for key in &expired {
                inner.entries.pop(key);
            }
            expired
        };

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "Evicted expired cache entries");
        }
        let count = expired.len();
        self.publish(expired.into_iter().map(CacheEvent::Removed).collect());
        count
    }
}
