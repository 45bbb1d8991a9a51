//! Read-through query client with request de-duplication.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};

use ledgersync_core::cache::{CacheStore, CachedValue, QueryKey};
use ledgersync_core::storage::RepositoryError;

/// Outcome of a fetch, shared by every caller waiting on it.
pub type FetchResult = Result<CachedValue, RepositoryError>;

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Delay before the first retry, doubled for each further one.
const RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Serves query results from the cache store, fetching on miss.
///
/// At most one fetch per key is in flight; concurrent callers for the same
/// key await the same future. Successful results are written to the store
/// unless the key was written while the fetch ran. Failures leave the store
/// untouched.
#[derive(Clone)]
pub struct QueryClient {
    store: Arc<dyn CacheStore>,
    stale_time: Duration,
    retries: u32,
    in_flight: Arc<Mutex<HashMap<QueryKey, SharedFetch>>>,
}

impl QueryClient {
    pub fn new(store: Arc<dyn CacheStore>, stale_time: Duration) -> Self {
        Self {
            store,
            stale_time,
            retries: 0,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Retries a failed fetch up to `retries` more times before giving up.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Returns the cached value for `key` if fresh, otherwise runs `fetch`
    /// (or joins the fetch already running for `key`).
    ///
    /// `fetch` is only called when this caller starts a new fetch, once per
    /// attempt.
    pub async fn query<F, Fut>(&self, key: QueryKey, fetch: F) -> FetchResult
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        if let Some(value) = self.store.get_fresh(&key, self.stale_time) {
            tracing::trace!(%key, "Cache hit");
            return Ok(value);
        }

        let shared = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&key) {
                Some(existing) => {
                    tracing::trace!(%key, "Joining in-flight fetch");
                    existing.clone()
                }
                None => {
                    tracing::trace!(%key, "Cache miss");
                    let generation = self.store.generation(&key);
                    let shared = self.start_fetch(key, generation, fetch);
                    in_flight.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn start_fetch<F, Fut>(&self, key: QueryKey, generation: u64, fetch: F) -> SharedFetch
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let retries = self.retries;

        async move {
            let mut attempt = 0;
            let result = loop {
                match fetch().await {
                    Err(err) if attempt < retries => {
                        attempt += 1;
                        tracing::debug!(%key, attempt, error = %err, "Retrying query fetch");
                        tokio::time::sleep(retry_delay(attempt)).await;
                    }
                    result => break result,
                }
            };

            match &result {
                Ok(value) => {
                    if store.set_if_unchanged(key, value.clone(), generation) {
                        tracing::trace!(%key, count = value.len(), "Fetched query");
                    } else {
                        tracing::trace!(%key, "Key written during fetch, result not cached");
                    }
                }
                Err(err) => tracing::warn!(%key, error = %err, "Query fetch failed"),
            }
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            result
        }
        .boxed()
        .shared()
    }
}

fn retry_delay(attempt: u32) -> Duration {
    RETRY_DELAY
        .saturating_mul(1 << attempt.saturating_sub(1).min(5))
        .min(MAX_RETRY_DELAY)
}
