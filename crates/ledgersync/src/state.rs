//! Shared ledger state.
//!
//! Wires one cache store into the query client and the mutation
//! coordinator so that reads and optimistic writes observe the same
//! entries. Cloning is cheap and shares everything.

use std::sync::Arc;

use ledgersync_core::cache::CacheStore;
use ledgersync_core::clock::{Clock, SystemClock};
use ledgersync_core::money::CurrencyFormat;
use uuid::Uuid;

use crate::cache::MemoryCacheStore;
use crate::config::Config;
use crate::mock_data::demo_ledger;
use crate::mutation::MutationCoordinator;
use crate::query::{LedgerQueries, QueryClient};
use crate::storage::{InMemoryRepository, Repositories};

#[derive(Clone)]
pub struct LedgerState {
    pub store: Arc<dyn CacheStore>,
    pub queries: LedgerQueries,
    pub mutations: MutationCoordinator,
    pub clock: Arc<dyn Clock>,
    pub currency: CurrencyFormat,
}

impl LedgerState {
    /// Creates state over the given repositories with an in-memory cache.
    pub fn new(config: &Config, repositories: Repositories, clock: Arc<dyn Clock>) -> Self {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(
            config.cache_max_entries,
            config.retention(),
        ));
        let client = QueryClient::new(Arc::clone(&store), config.stale_time())
            .with_retries(config.query_retries);
        let queries = LedgerQueries::new(client, repositories.clone());
        let mutations = MutationCoordinator::new(
            Arc::clone(&store),
            repositories,
            Arc::clone(&clock),
            config.notification_capacity,
        );

        Self {
            store,
            queries,
            mutations,
            clock,
            currency: CurrencyFormat::brl().with_symbol(config.currency_symbol.clone()),
        }
    }

    /// Creates state backed by an in-memory repository seeded with demo
    /// records around the current month.
    pub async fn with_demo_data(config: &Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let repository = InMemoryRepository::new(Uuid::new_v4(), Arc::clone(&clock));

        let (transactions, categories, payment_methods) = demo_ledger(clock.today());
        repository
            .seed(transactions, categories, payment_methods)
            .await;
        tracing::debug!(user_id = %repository.user_id(), "Seeded demo ledger");

        Self::new(
            config,
            Repositories::from_backend(Arc::new(repository)),
            clock,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::NaiveDate;
    use ledgersync_core::cache::QueryKey;
    use ledgersync_core::clock::FixedClock;
    use ledgersync_core::ledger::{Amount, Description, NewTransaction, TransactionType};
    use rust_decimal_macros::dec;

    fn config() -> Config {
        Config {
            cache_stale_seconds: 300,
            cache_retention_seconds: 1800,
            cache_max_entries: 100,
            query_retries: 0,
            currency_symbol: "R$".to_string(),
            notification_capacity: 4,
        }
    }

    #[tokio::test]
    async fn test_queries_and_mutations_share_the_store() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(today));
        let repository = Arc::new(InMemoryRepository::new(Uuid::new_v4(), Arc::clone(&clock)));
        let state = LedgerState::new(&config(), Repositories::from_backend(repository), clock);

        assert!(state
            .queries
            .transactions_by_month(2, 2025)
            .await
            .unwrap()
            .is_empty());

        state
            .mutations
            .create_transaction(NewTransaction::new(
                Description::new("Coffee").unwrap(),
                Amount::new(dec!(7.50)).unwrap(),
                today,
                TransactionType::Expense,
            ))
            .await
            .unwrap();

        let month = QueryKey::month(ledgersync_core::storage::MonthKey::containing(today));
        assert!(state.store.get(&month).unwrap().invalidated);
        assert_eq!(
            state.queries.transactions_by_month(2, 2025).await.unwrap().len(),
            1
        );
        assert_eq!(state.queries.client().stale_time(), Duration::from_secs(300));
        assert_eq!(state.queries.client().retries(), 0);
    }

    #[tokio::test]
    async fn test_with_demo_data_seeds_current_month() {
        let state = LedgerState::with_demo_data(&config()).await;
        let month = ledgersync_core::storage::MonthKey::containing(state.clock.today());

        let transactions = state
            .queries
            .transactions_by_month(month.month(), month.year())
            .await
            .unwrap();

        assert!(!transactions.is_empty());
        assert!(!state.queries.categories().await.unwrap().is_empty());
    }
}
