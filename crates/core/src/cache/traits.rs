use std::time::Duration;

use tokio::sync::broadcast;

use super::{CacheEntry, CacheEvent, CachedValue, Collection, QueryKey, Snapshot};

/// Keyed store of query results shared by the query client and the
/// mutation coordinator.
///
/// Operations are synchronous and never fail. Every write notifies
/// subscribers.
pub trait CacheStore: Send + Sync {
    /// Gets an entry by key. Entries past the retention window are absent.
    fn get(&self, key: &QueryKey) -> Option<CacheEntry>;

    /// Gets a value only if it is not invalidated and younger than `stale_time`.
    fn get_fresh(&self, key: &QueryKey, stale_time: Duration) -> Option<CachedValue> {
        self.get(key)
            .filter(|entry| entry.is_fresh(stale_time))
            .map(|entry| entry.value)
    }

    /// Overwrites a value with fresh metadata.
    fn set(&self, key: QueryKey, value: CachedValue);

    /// Write counter for a key. Every set, patch, restore and invalidation
    /// of the key moves it forward, whether or not the key is cached.
    fn generation(&self, key: &QueryKey) -> u64;

    /// Writes `value` like [`set`](Self::set) only if the key's generation is
    /// still `generation`. Returns false and leaves the store untouched if
    /// the key was written in between.
    fn set_if_unchanged(&self, key: QueryKey, value: CachedValue, generation: u64) -> bool;

    /// Rewrites a cached value in place, keeping its metadata.
    ///
    /// Returns false without calling `patch` if the key is absent.
    fn patch(&self, key: &QueryKey, patch: &mut dyn FnMut(&mut CachedValue)) -> bool;

    /// Captures every cached key of a collection.
    fn snapshot(&self, collection: Collection) -> Snapshot {
        let keys = self.keys(collection);
        self.snapshot_keys(&keys)
    }

    /// Captures the named keys, recording absent ones.
    fn snapshot_keys(&self, keys: &[QueryKey]) -> Snapshot;

    /// Writes captured entries back verbatim and removes keys captured as absent.
    ///
    /// A key invalidated since the capture stays invalidated.
    fn restore(&self, snapshot: Snapshot);

    /// Marks every cached key of a collection as stale.
    fn invalidate(&self, collection: Collection) {
        let keys = self.keys(collection);
        self.invalidate_keys(&keys);
    }

    /// Marks the named keys as stale. Absent keys are ignored.
    fn invalidate_keys(&self, keys: &[QueryKey]);

    /// Currently cached keys of a collection.
    fn keys(&self, collection: Collection) -> Vec<QueryKey>;

    /// Subscribes to write notifications.
    fn subscribe(&self) -> broadcast::Receiver<CacheEvent>;

    /// Drops entries past the retention window, returning how many were dropped.
    fn evict_expired(&self) -> usize;
}
