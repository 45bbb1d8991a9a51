//! Typed queries over the ledger collections.

use std::sync::Arc;

use futures_util::FutureExt;

use ledgersync_core::cache::{CachedValue, QueryKey};
use ledgersync_core::ledger::{
    filter_categories_by_type, Category, PaymentMethod, Transaction, TransactionType,
};
use ledgersync_core::storage::MonthKey;

use crate::storage::Repositories;

use super::{QueryClient, Result};

/// Ledger reads served through the [`QueryClient`].
#[derive(Clone)]
pub struct LedgerQueries {
    client: QueryClient,
    repositories: Repositories,
}

impl LedgerQueries {
    pub fn new(client: QueryClient, repositories: Repositories) -> Self {
        Self {
            client,
            repositories,
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Transactions of a zero-based month, newest first.
    pub async fn transactions_by_month(&self, month: u32, year: i32) -> Result<Vec<Transaction>> {
        let month = MonthKey::new(month, year)?;
        let key = QueryKey::month(month);
        let repository = Arc::clone(&self.repositories.transactions);

        let value = self
            .client
            .query(key, move || {
                let repository = Arc::clone(&repository);
                async move {
                    repository
                        .list_by_month(month)
                        .await
                        .map(CachedValue::Transactions)
                }
                .boxed()
            })
            .await?;
        Ok(value.into_transactions(&key)?)
    }

    /// Pending transactions dated before today, oldest first.
    pub async fn overdue_transactions(&self) -> Result<Vec<Transaction>> {
        let key = QueryKey::OverdueTransactions;
        let repository = Arc::clone(&self.repositories.transactions);

        let value = self
            .client
            .query(key, move || {
                let repository = Arc::clone(&repository);
                async move {
                    repository
                        .list_overdue()
                        .await
                        .map(CachedValue::Transactions)
                }
                .boxed()
            })
            .await?;
        Ok(value.into_transactions(&key)?)
    }

    /// Every category, by name.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let key = QueryKey::Categories;
        let repository = Arc::clone(&self.repositories.categories);

        let value = self
            .client
            .query(key, move || {
                let repository = Arc::clone(&repository);
                async move { repository.list().await.map(CachedValue::Categories) }.boxed()
            })
            .await?;
        Ok(value.into_categories(&key)?)
    }

    /// Categories a form for `kind` may offer.
    pub async fn categories_for_type(&self, kind: TransactionType) -> Result<Vec<Category>> {
        let categories = self.categories().await?;
        Ok(filter_categories_by_type(&categories, kind)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Every payment method, by name.
    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        let key = QueryKey::PaymentMethods;
        let repository = Arc::clone(&self.repositories.payment_methods);

        let value = self
            .client
            .query(key, move || {
                let repository = Arc::clone(&repository);
                async move { repository.list().await.map(CachedValue::PaymentMethods) }.boxed()
            })
            .await?;
        Ok(value.into_payment_methods(&key)?)
    }
}
