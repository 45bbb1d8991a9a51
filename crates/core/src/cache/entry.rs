use std::time::Duration;

use tokio::time::Instant;

use crate::ledger::{Category, PaymentMethod, RecordId, Record, Transaction};

use super::{CacheError, Collection, QueryKey, Result};

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Transactions(Vec<Transaction>),
    Categories(Vec<Category>),
    PaymentMethods(Vec<PaymentMethod>),
}

impl CachedValue {
    pub fn collection(&self) -> Collection {
        match self {
            CachedValue::Transactions(_) => Collection::Transactions,
            CachedValue::Categories(_) => Collection::Categories,
            CachedValue::PaymentMethods(_) => Collection::PaymentMethods,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CachedValue::Transactions(items) => items.len(),
            CachedValue::Categories(items) => items.len(),
            CachedValue::PaymentMethods(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if any record in the value carries `id`.
    pub fn contains(&self, id: &RecordId) -> bool {
        match self {
            CachedValue::Transactions(items) => items.iter().any(|t| t.record_id() == id),
            CachedValue::Categories(items) => items.iter().any(|c| c.record_id() == id),
            CachedValue::PaymentMethods(items) => items.iter().any(|m| m.record_id() == id),
        }
    }

    pub fn into_transactions(self, key: &QueryKey) -> Result<Vec<Transaction>> {
        match self {
            CachedValue::Transactions(items) => Ok(items),
            other => Err(mismatch(key, Collection::Transactions, &other)),
        }
    }

    pub fn into_categories(self, key: &QueryKey) -> Result<Vec<Category>> {
        match self {
            CachedValue::Categories(items) => Ok(items),
            other => Err(mismatch(key, Collection::Categories, &other)),
        }
    }

    pub fn into_payment_methods(self, key: &QueryKey) -> Result<Vec<PaymentMethod>> {
        match self {
            CachedValue::PaymentMethods(items) => Ok(items),
            other => Err(mismatch(key, Collection::PaymentMethods, &other)),
        }
    }
}

fn mismatch(key: &QueryKey, expected: Collection, found: &CachedValue) -> CacheError {
    CacheError::Mismatch {
        key: key.to_string(),
        expected,
        found: found.collection(),
    }
}

/// A cached value with its freshness metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub fetched_at: Instant,
    pub invalidated: bool,
}

impl CacheEntry {
    /// Creates a fresh entry stamped with the current instant.
    pub fn new(value: CachedValue) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            invalidated: false,
        }
    }

    /// Time elapsed since the value was fetched.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }

    /// Fresh entries are served without refetching.
    pub fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated && self.age() < stale_time
    }

    /// Entries past the retention window are dropped.
    pub fn is_expired(&self, retention: Duration) -> bool {
        self.age() >= retention
    }
}

/// Captured cache state for a set of keys.
///
/// Keys that were not cached are recorded as `None` so restoring removes
/// anything written under them since.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(QueryKey, Option<CacheEntry>)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: QueryKey, entry: Option<CacheEntry>) {
        self.entries.push((key, entry));
    }

    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Returns the captured entry for `key`, or `None` if the key was not
    /// captured or was absent.
    pub fn entry(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, entry)| entry.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Snapshot {
    type Item = (QueryKey, Option<CacheEntry>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Notification sent to cache observers after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
    Removed(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Updated(key) | CacheEvent::Invalidated(key) | CacheEvent::Removed(key) => {
                key
            }
        }
    }
}
