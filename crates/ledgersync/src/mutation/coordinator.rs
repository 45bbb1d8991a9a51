//! Optimistic mutation coordinator.
//!
//! Every write follows the same sequence: capture the affected cache keys,
//! patch the cached values so the change is visible at once, then call the
//! repository. On success the touched keys are invalidated so the next read
//! refetches the authoritative records. On failure the captured entries are
//! restored verbatim and a [`Notification`] is broadcast. Overlapping
//! mutations each restore their own capture, so the last one to settle wins;
//! an invalidation from an earlier success survives a later rollback.

use std::cmp::Ordering as CmpOrdering;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use ledgersync_core::cache::{CacheStore, CachedValue, Collection, QueryKey};
use ledgersync_core::clock::Clock;
use ledgersync_core::ledger::{
    compare_newest_first, compare_oldest_first, insert_sorted, remove_by_id, Category,
    CategoryUpdate, NewCategory, NewPaymentMethod, NewTransaction, PaymentMethod,
    PaymentMethodUpdate, PendingId, Record, RecordId, Transaction, TransactionStatus,
    TransactionUpdate,
};
use ledgersync_core::storage;

use crate::storage::Repositories;

use super::{MutationError, Operation, Result};

/// Message broadcast when a mutation is rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub operation: Operation,
    pub message: String,
}

/// Applies writes optimistically to the cache and reconciles them with the
/// repositories.
#[derive(Clone)]
pub struct MutationCoordinator {
    store: Arc<dyn CacheStore>,
    repositories: Repositories,
    clock: Arc<dyn Clock>,
    next_pending: Arc<AtomicU64>,
    notifications: broadcast::Sender<Notification>,
}

impl MutationCoordinator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        repositories: Repositories,
        clock: Arc<dyn Clock>,
        notification_capacity: usize,
    ) -> Self {
        let (notifications, _) = broadcast::channel(notification_capacity.max(1));
        Self {
            store,
            repositories,
            clock,
            next_pending: Arc::new(AtomicU64::new(1)),
            notifications,
        }
    }

    /// Subscribes to rollback notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Creates a transaction, showing a placeholder until the repository answers.
    pub async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction> {
        let placeholder = transaction.to_placeholder(self.next_pending_id());
        let keys = QueryKey::for_transaction(&placeholder, self.clock.today());

        self.run(
            Operation::CreateTransaction,
            &keys,
            |key, value| {
                if let CachedValue::Transactions(items) = value {
                    insert_sorted(items, placeholder.clone(), transaction_order(key));
                }
            },
            self.repositories.transactions.create(&transaction),
        )
        .await
    }

    /// Applies a field update set to a transaction.
    ///
    /// The record is moved between cached lists when the update changes
    /// where it belongs.
    pub async fn update_transaction(
        &self,
        id: Uuid,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        let today = self.clock.today();
        let record_id = RecordId::Real(id);
        let keys = self.store.keys(Collection::Transactions);
        let updated = self
            .cached_transaction(&keys, &record_id)
            .map(|current| update.apply(&current));

        self.run(
            Operation::UpdateTransaction,
            &keys,
            |key, value| {
                if let CachedValue::Transactions(items) = value {
                    remove_by_id(items, &record_id);
                    if let Some(updated) = &updated {
                        if key.admits(updated, today) {
                            insert_sorted(items, updated.clone(), transaction_order(key));
                        }
                    }
                }
            },
            self.repositories.transactions.update(id, &update),
        )
        .await
    }

    /// Marks a transaction paid or pending.
    pub async fn set_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<Transaction> {
        self.update_transaction(id, TransactionUpdate::status_only(status))
            .await
    }

    /// Deletes a transaction, hiding it from every cached list at once.
    pub async fn delete_transaction(&self, id: Uuid) -> Result<()> {
        let record_id = RecordId::Real(id);
        let keys: Vec<QueryKey> = self
            .store
            .keys(Collection::Transactions)
            .into_iter()
            .filter(|key| {
                self.store
                    .get(key)
                    .is_some_and(|entry| entry.value.contains(&record_id))
            })
            .collect();

        self.run(
            Operation::DeleteTransaction,
            &keys,
            |_, value| {
                if let CachedValue::Transactions(items) = value {
                    remove_by_id(items, &record_id);
                }
            },
            self.repositories.transactions.delete(id),
        )
        .await
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let placeholder = category
            .clone()
            .into_category(RecordId::Pending(self.next_pending_id()));

        self.run(
            Operation::CreateCategory,
            &[QueryKey::Categories],
            |_, value| {
                if let CachedValue::Categories(items) = value {
                    insert_sorted(items, placeholder.clone(), |a, b| a.name.cmp(&b.name));
                }
            },
            self.repositories.categories.create(&category),
        )
        .await
    }

    pub async fn update_category(&self, id: Uuid, update: CategoryUpdate) -> Result<Category> {
        let record_id = RecordId::Real(id);

        self.run(
            Operation::UpdateCategory,
            &[QueryKey::Categories],
            |_, value| {
                if let CachedValue::Categories(items) = value {
                    replace_sorted(items, &record_id, |c| update.apply(c), |a, b| {
                        a.name.cmp(&b.name)
                    });
                }
            },
            self.repositories.categories.update(id, &update),
        )
        .await
    }

    /// Deletes a category. Transactions referencing it are left as is.
    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        let record_id = RecordId::Real(id);

        self.run(
            Operation::DeleteCategory,
            &[QueryKey::Categories],
            |_, value| {
                if let CachedValue::Categories(items) = value {
                    remove_by_id(items, &record_id);
                }
            },
            self.repositories.categories.delete(id),
        )
        .await
    }

    // ========================================================================
    // Payment methods
    // ========================================================================

    pub async fn create_payment_method(&self, method: NewPaymentMethod) -> Result<PaymentMethod> {
        let placeholder = method
            .clone()
            .into_payment_method(RecordId::Pending(self.next_pending_id()));

        self.run(
            Operation::CreatePaymentMethod,
            &[QueryKey::PaymentMethods],
            |_, value| {
                if let CachedValue::PaymentMethods(items) = value {
                    insert_sorted(items, placeholder.clone(), |a, b| a.name.cmp(&b.name));
                }
            },
            self.repositories.payment_methods.create(&method),
        )
        .await
    }

    pub async fn update_payment_method(
        &self,
        id: Uuid,
        update: PaymentMethodUpdate,
    ) -> Result<PaymentMethod> {
        let record_id = RecordId::Real(id);

        self.run(
            Operation::UpdatePaymentMethod,
            &[QueryKey::PaymentMethods],
            |_, value| {
                if let CachedValue::PaymentMethods(items) = value {
                    replace_sorted(items, &record_id, |m| update.apply(m), |a, b| {
                        a.name.cmp(&b.name)
                    });
                }
            },
            self.repositories.payment_methods.update(id, &update),
        )
        .await
    }

    pub async fn delete_payment_method(&self, id: Uuid) -> Result<()> {
        let record_id = RecordId::Real(id);

        self.run(
            Operation::DeletePaymentMethod,
            &[QueryKey::PaymentMethods],
            |_, value| {
                if let CachedValue::PaymentMethods(items) = value {
                    remove_by_id(items, &record_id);
                }
            },
            self.repositories.payment_methods.delete(id),
        )
        .await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Runs one mutation: snapshot, optimistic patch, request, settle.
    ///
    /// `request` is not polled until the patch has been applied.
    async fn run<T, P, F>(
        &self,
        operation: Operation,
        keys: &[QueryKey],
        mut patch: P,
        request: F,
    ) -> Result<T>
    where
        P: FnMut(&QueryKey, &mut CachedValue),
        F: Future<Output = storage::Result<T>>,
    {
        let snapshot = self.store.snapshot_keys(keys);

        let mut patched = 0;
        for key in keys {
            if self.store.patch(key, &mut |value| patch(key, value)) {
                patched += 1;
            }
        }
        tracing::trace!(%operation, keys = keys.len(), patched, "Applied optimistic update");

        match request.await {
            Ok(record) => {
                self.store.invalidate_keys(keys);
                tracing::debug!(%operation, keys = keys.len(), "Mutation settled");
                Ok(record)
            }
            Err(source) => {
                self.store.restore(snapshot);
                tracing::warn!(%operation, error = %source, "Mutation failed, rolled back");

                let error = MutationError::new(operation, source);
                // No subscribers is fine
                let _ = self.notifications.send(Notification {
                    operation,
                    message: error.message.clone(),
                });
                Err(error)
            }
        }
    }

    fn next_pending_id(&self) -> PendingId {
        PendingId(self.next_pending.fetch_add(1, Ordering::Relaxed))
    }

    /// Finds the cached copy of a transaction in any of `keys`.
    fn cached_transaction(&self, keys: &[QueryKey], id: &RecordId) -> Option<Transaction> {
        keys.iter().find_map(|key| match self.store.get(key)?.value {
            CachedValue::Transactions(items) => items.into_iter().find(|t| t.record_id() == id),
            _ => None,
        })
    }
}

/// Sort order of the transaction list cached under `key`.
fn transaction_order(key: &QueryKey) -> fn(&Transaction, &Transaction) -> CmpOrdering {
    match key {
        QueryKey::OverdueTransactions => compare_oldest_first,
        _ => compare_newest_first,
    }
}

/// Replaces the record with `id` by `apply(record)`, keeping the list sorted.
fn replace_sorted<T, A, C>(items: &mut Vec<T>, id: &RecordId, apply: A, compare: C)
where
    T: Record,
    A: FnOnce(&T) -> T,
    C: Fn(&T, &T) -> CmpOrdering,
{
    if let Some(position) = items.iter().position(|item| item.record_id() == id) {
        let updated = apply(&items.remove(position));
        insert_sorted(items, updated, compare);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use ledgersync_core::clock::FixedClock;
    use ledgersync_core::ledger::{Amount, Description, Name, TransactionType};
    use ledgersync_core::storage::{
        CategoryRepository, MonthKey, PaymentMethodRepository, RepositoryError,
        TransactionRepository,
    };
    use rust_decimal_macros::dec;
    use futures_util::FutureExt;
    use tokio::sync::{Mutex, MutexGuard, Notify};

    use crate::cache::MemoryCacheStore;
    use crate::query::{LedgerQueries, QueryClient};
    use crate::storage::InMemoryRepository;

    const STALE_TIME: Duration = Duration::from_secs(300);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 3, 15)
    }

    fn march() -> QueryKey {
        QueryKey::month(MonthKey::new(2, 2025).unwrap())
    }

    fn april() -> QueryKey {
        QueryKey::month(MonthKey::new(3, 2025).unwrap())
    }

    /// Repository wrapper with call counting, a failure switch, and a gate
    /// that holds write calls in flight.
    ///
    /// Writes pass the gate one at a time in arrival order. Queued outcomes
    /// (`true` fails) are consumed in that order before the switch applies.
    struct MockRepository {
        inner: InMemoryRepository,
        writes: AtomicUsize,
        fail: AtomicBool,
        outcomes: std::sync::Mutex<VecDeque<bool>>,
        entered: Notify,
        gate: Mutex<()>,
    }

    impl MockRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryRepository::new(Uuid::new_v4(), Arc::new(FixedClock(today()))),
                writes: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                outcomes: std::sync::Mutex::new(VecDeque::new()),
                entered: Notify::new(),
                gate: Mutex::new(()),
            }
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn queue_outcomes(&self, fails: &[bool]) {
            self.outcomes.lock().unwrap().extend(fails);
        }

        fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Waits at the gate; the returned guard keeps later writes queued
        /// until this one has reached the inner repository.
        async fn write(&self) -> storage::Result<MutexGuard<'_, ()>> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            let open = self.gate.lock().await;
            let queued = self.outcomes.lock().unwrap().pop_front();
            if queued.unwrap_or_else(|| self.fail.load(Ordering::SeqCst)) {
                return Err(RepositoryError::ConnectionFailed("offline".to_string()));
            }
            Ok(open)
        }
    }

    #[async_trait]
    impl TransactionRepository for MockRepository {
        async fn list_by_month(&self, month: MonthKey) -> storage::Result<Vec<Transaction>> {
            self.inner.list_by_month(month).await
        }

        async fn list_overdue(&self) -> storage::Result<Vec<Transaction>> {
            self.inner.list_overdue().await
        }

        async fn create(&self, transaction: &NewTransaction) -> storage::Result<Transaction> {
            let _open = self.write().await?;
            TransactionRepository::create(&self.inner, transaction).await
        }

        async fn update(
            &self,
            id: Uuid,
            update: &TransactionUpdate,
        ) -> storage::Result<Transaction> {
            let _open = self.write().await?;
            TransactionRepository::update(&self.inner, id, update).await
        }

        async fn delete(&self, id: Uuid) -> storage::Result<()> {
            let _open = self.write().await?;
            TransactionRepository::delete(&self.inner, id).await
        }
    }

    #[async_trait]
    impl CategoryRepository for MockRepository {
        async fn list(&self) -> storage::Result<Vec<Category>> {
            CategoryRepository::list(&self.inner).await
        }

        async fn create(&self, category: &NewCategory) -> storage::Result<Category> {
            let _open = self.write().await?;
            CategoryRepository::create(&self.inner, category).await
        }

        async fn update(&self, id: Uuid, update: &CategoryUpdate) -> storage::Result<Category> {
            let _open = self.write().await?;
            CategoryRepository::update(&self.inner, id, update).await
        }

        async fn delete(&self, id: Uuid) -> storage::Result<()> {
            let _open = self.write().await?;
            CategoryRepository::delete(&self.inner, id).await
        }
    }

    #[async_trait]
    impl PaymentMethodRepository for MockRepository {
        async fn list(&self) -> storage::Result<Vec<PaymentMethod>> {
            PaymentMethodRepository::list(&self.inner).await
        }

        async fn create(&self, method: &NewPaymentMethod) -> storage::Result<PaymentMethod> {
            let _open = self.write().await?;
            PaymentMethodRepository::create(&self.inner, method).await
        }

        async fn update(
            &self,
            id: Uuid,
            update: &PaymentMethodUpdate,
        ) -> storage::Result<PaymentMethod> {
            let _open = self.write().await?;
            PaymentMethodRepository::update(&self.inner, id, update).await
        }

        async fn delete(&self, id: Uuid) -> storage::Result<()> {
            let _open = self.write().await?;
            PaymentMethodRepository::delete(&self.inner, id).await
        }
    }

    struct Fixture {
        repo: Arc<MockRepository>,
        store: Arc<MemoryCacheStore>,
        queries: LedgerQueries,
        coordinator: MutationCoordinator,
        rent: Transaction,
        salary: Transaction,
        late_bill: Transaction,
        food: Category,
        pix: PaymentMethod,
    }

    impl Fixture {
        /// Seeds the repository and warms the March, overdue, category and
        /// payment method keys.
        async fn new() -> Self {
            let repo = Arc::new(MockRepository::new());
            let rent = Transaction::expense("Rent", dec!(1500), date(2025, 3, 10))
                .with_id(Uuid::new_v4())
                .paid();
            let salary =
                Transaction::income("Salary", dec!(3500), date(2025, 3, 1)).with_id(Uuid::new_v4());
            let late_bill = Transaction::expense("Power", dec!(200), date(2025, 2, 20))
                .with_id(Uuid::new_v4());
            let food = Category::new("Food", TransactionType::Expense).with_id(Uuid::new_v4());
            let pix = PaymentMethod::new("Pix").with_id(Uuid::new_v4());
            repo.inner
                .seed(
                    vec![rent.clone(), salary.clone(), late_bill.clone()],
                    vec![
                        food.clone(),
                        Category::new("Transport", TransactionType::Expense),
                    ],
                    vec![pix.clone()],
                )
                .await;

            let store = Arc::new(MemoryCacheStore::new(1000, Duration::from_secs(1800)));
            let repositories = Repositories::from_backend(Arc::clone(&repo));
            let queries = LedgerQueries::new(
                QueryClient::new(store.clone(), STALE_TIME),
                repositories.clone(),
            );
            let coordinator = MutationCoordinator::new(
                store.clone(),
                repositories,
                Arc::new(FixedClock(today())),
                8,
            );

            queries.transactions_by_month(2, 2025).await.unwrap();
            queries.overdue_transactions().await.unwrap();
            queries.categories().await.unwrap();
            queries.payment_methods().await.unwrap();

            Self {
                repo,
                store,
                queries,
                coordinator,
                rent,
                salary,
                late_bill,
                food,
                pix,
            }
        }

        fn transactions(&self, key: &QueryKey) -> Vec<Transaction> {
            match self.store.get(key).map(|entry| entry.value) {
                Some(CachedValue::Transactions(items)) => items,
                _ => vec![],
            }
        }

        fn descriptions(&self, key: &QueryKey) -> Vec<String> {
            self.transactions(key)
                .into_iter()
                .map(|t| t.description)
                .collect()
        }

        fn category_names(&self) -> Vec<String> {
            match self.store.get(&QueryKey::Categories).map(|entry| entry.value) {
                Some(CachedValue::Categories(items)) => items.into_iter().map(|c| c.name).collect(),
                _ => vec![],
            }
        }
    }

    /// Starts a create in the background and waits until it reaches the gate.
    async fn spawn_create(
        fx: &Fixture,
        description: &str,
        on: NaiveDate,
    ) -> tokio::task::JoinHandle<Result<Transaction>> {
        let coordinator = fx.coordinator.clone();
        let new = new_expense(description, on);
        let handle = tokio::spawn(async move { coordinator.create_transaction(new).await });
        fx.repo.entered.notified().await;
        handle
    }

    fn new_expense(description: &str, on: NaiveDate) -> NewTransaction {
        NewTransaction::new(
            Description::new(description).unwrap(),
            Amount::new(dec!(80)).unwrap(),
            on,
            TransactionType::Expense,
        )
    }

    #[tokio::test]
    async fn test_create_shows_placeholder_while_in_flight() {
        let fx = Fixture::new().await;
        let gate = fx.repo.gate.lock().await;

        let coordinator = fx.coordinator.clone();
        let handle = tokio::spawn(async move {
            coordinator
                .create_transaction(new_expense("Groceries", date(2025, 3, 12)))
                .await
        });
        fx.repo.entered.notified().await;

        let listed = fx.transactions(&march());
        assert_eq!(
            fx.descriptions(&march()),
            vec!["Groceries", "Rent", "Salary"]
        );
        assert!(listed[0].id.is_pending());
        // Pending and dated before today
        assert!(fx
            .descriptions(&QueryKey::OverdueTransactions)
            .contains(&"Groceries".to_string()));

        drop(gate);
        let created = handle.await.unwrap().unwrap();
        assert!(created.id.real().is_some());
    }

    #[tokio::test]
    async fn test_create_settles_to_real_record_after_refetch() {
        let fx = Fixture::new().await;

        let created = fx
            .coordinator
            .create_transaction(new_expense("Groceries", date(2025, 3, 12)))
            .await
            .unwrap();

        assert!(fx.store.get(&march()).unwrap().invalidated);
        assert!(fx.store.get(&QueryKey::OverdueTransactions).unwrap().invalidated);

        let refetched = fx.queries.transactions_by_month(2, 2025).await.unwrap();
        assert!(refetched.iter().all(|t| !t.id.is_pending()));
        assert!(refetched.iter().any(|t| t.id == created.id));
    }

    #[tokio::test]
    async fn test_create_future_dated_skips_overdue() {
        let fx = Fixture::new().await;
        let before = fx.store.get(&QueryKey::OverdueTransactions);

        fx.coordinator
            .create_transaction(new_expense("Gym", date(2025, 3, 20)))
            .await
            .unwrap();

        assert_eq!(fx.store.get(&QueryKey::OverdueTransactions), before);
    }

    #[tokio::test]
    async fn test_create_failure_restores_exactly() {
        let fx = Fixture::new().await;
        fx.store.invalidate_keys(&[QueryKey::OverdueTransactions]);
        let march_before = fx.store.get(&march());
        let overdue_before = fx.store.get(&QueryKey::OverdueTransactions);
        let mut notifications = fx.coordinator.notifications();
        fx.repo.set_fail(true);

        let error = fx
            .coordinator
            .create_transaction(new_expense("Groceries", date(2025, 3, 12)))
            .await
            .unwrap_err();

        assert_eq!(error.operation, Operation::CreateTransaction);
        assert_eq!(error.message, "Failed to create transaction, please retry");
        assert_eq!(
            error.source,
            RepositoryError::ConnectionFailed("offline".to_string())
        );
        assert_eq!(fx.store.get(&march()), march_before);
        assert_eq!(fx.store.get(&QueryKey::OverdueTransactions), overdue_before);
        assert_eq!(
            notifications.recv().await.unwrap(),
            Notification {
                operation: Operation::CreateTransaction,
                message: "Failed to create transaction, please retry".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_create_failure_keeps_absent_keys_absent() {
        let fx = Fixture::new().await;
        fx.repo.set_fail(true);

        fx.coordinator
            .create_transaction(new_expense("Trip", date(2025, 4, 2)))
            .await
            .unwrap_err();

        assert_eq!(fx.store.get(&april()), None);
    }

    #[tokio::test]
    async fn test_update_moves_record_between_months() {
        let fx = Fixture::new().await;
        fx.queries.transactions_by_month(3, 2025).await.unwrap();
        let gate = fx.repo.gate.lock().await;

        let coordinator = fx.coordinator.clone();
        let id = fx.rent.id.real().unwrap();
        let handle = tokio::spawn(async move {
            coordinator
                .update_transaction(id, TransactionUpdate::new().with_date(date(2025, 4, 1)))
                .await
        });
        fx.repo.entered.notified().await;

        assert_eq!(fx.descriptions(&march()), vec!["Salary"]);
        assert_eq!(fx.descriptions(&april()), vec!["Rent"]);

        drop(gate);
        let updated = handle.await.unwrap().unwrap();
        assert_eq!(updated.date, date(2025, 4, 1));
        assert!(fx.store.get(&march()).unwrap().invalidated);
        assert!(fx.store.get(&april()).unwrap().invalidated);
    }

    #[tokio::test]
    async fn test_status_toggle_updates_overdue_optimistically() {
        let fx = Fixture::new().await;
        let gate = fx.repo.gate.lock().await;

        let coordinator = fx.coordinator.clone();
        let id = fx.late_bill.id.real().unwrap();
        let handle = tokio::spawn(async move {
            coordinator
                .set_transaction_status(id, TransactionStatus::Paid)
                .await
        });
        fx.repo.entered.notified().await;

        assert_eq!(
            fx.descriptions(&QueryKey::OverdueTransactions),
            vec!["Salary"]
        );

        drop(gate);
        assert!(handle.await.unwrap().unwrap().is_paid());
    }

    #[tokio::test]
    async fn test_update_failure_restores_every_key() {
        let fx = Fixture::new().await;
        let march_before = fx.store.get(&march());
        let overdue_before = fx.store.get(&QueryKey::OverdueTransactions);
        fx.repo.set_fail(true);

        let error = fx
            .coordinator
            .set_transaction_status(fx.salary.id.real().unwrap(), TransactionStatus::Paid)
            .await
            .unwrap_err();

        assert_eq!(error.message, "Failed to update transaction, please retry");
        assert_eq!(fx.store.get(&march()), march_before);
        assert_eq!(fx.store.get(&QueryKey::OverdueTransactions), overdue_before);
    }

    #[tokio::test]
    async fn test_delete_touches_only_keys_containing_record() {
        let fx = Fixture::new().await;
        let id = fx.rent.id.real().unwrap();

        fx.coordinator.delete_transaction(id).await.unwrap();

        assert!(!fx
            .transactions(&march())
            .iter()
            .any(|t| t.id.is(id)));
        assert!(fx.store.get(&march()).unwrap().invalidated);
        assert!(!fx.store.get(&QueryKey::OverdueTransactions).unwrap().invalidated);
    }

    #[tokio::test]
    async fn test_delete_failure_restores_record() {
        let fx = Fixture::new().await;
        let before = fx.store.get(&march());
        fx.repo.set_fail(true);

        let error = fx
            .coordinator
            .delete_transaction(fx.rent.id.real().unwrap())
            .await
            .unwrap_err();

        assert_eq!(error.operation, Operation::DeleteTransaction);
        assert_eq!(fx.store.get(&march()), before);
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let fx = Fixture::new().await;

        let health = fx
            .coordinator
            .create_category(NewCategory::new(
                Name::new("Health").unwrap(),
                TransactionType::Expense,
            ))
            .await
            .unwrap();
        fx.queries.categories().await.unwrap();
        assert_eq!(fx.category_names(), vec!["Food", "Health", "Transport"]);

        fx.coordinator
            .update_category(
                fx.food.id.real().unwrap(),
                CategoryUpdate::new().with_name(Name::new("Yummy").unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(fx.category_names(), vec!["Health", "Transport", "Yummy"]);

        fx.coordinator
            .delete_category(health.id.real().unwrap())
            .await
            .unwrap();
        assert_eq!(fx.category_names(), vec!["Transport", "Yummy"]);
    }

    #[tokio::test]
    async fn test_category_create_failure_rolls_back() {
        let fx = Fixture::new().await;
        let before = fx.store.get(&QueryKey::Categories);
        fx.repo.set_fail(true);

        let error = fx
            .coordinator
            .create_category(NewCategory::new(
                Name::new("Health").unwrap(),
                TransactionType::Expense,
            ))
            .await
            .unwrap_err();

        assert_eq!(error.message, "Failed to create category, please retry");
        assert_eq!(fx.store.get(&QueryKey::Categories), before);
    }

    #[tokio::test]
    async fn test_payment_method_lifecycle_and_rollback() {
        let fx = Fixture::new().await;
        let pix_id = fx.pix.id.real().unwrap();

        let updated = fx
            .coordinator
            .update_payment_method(pix_id, PaymentMethodUpdate::new().with_icon(Some("qr".into())))
            .await
            .unwrap();
        assert_eq!(updated.icon.as_deref(), Some("qr"));

        fx.queries.payment_methods().await.unwrap();
        let before = fx.store.get(&QueryKey::PaymentMethods);
        fx.repo.set_fail(true);
        let error = fx
            .coordinator
            .delete_payment_method(pix_id)
            .await
            .unwrap_err();

        assert_eq!(error.message, "Failed to delete payment method, please retry");
        assert_eq!(fx.store.get(&QueryKey::PaymentMethods), before);

        fx.repo.set_fail(false);
        fx.coordinator
            .create_payment_method(NewPaymentMethod::new(Name::new("Cash").unwrap()))
            .await
            .unwrap();
        let names: Vec<String> = fx
            .queries
            .payment_methods()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Cash", "Pix"]);
    }

    #[tokio::test]
    async fn test_mutation_without_cached_keys() {
        let repo = Arc::new(MockRepository::new());
        let store = Arc::new(MemoryCacheStore::new(1000, Duration::from_secs(1800)));
        let coordinator = MutationCoordinator::new(
            store.clone(),
            Repositories::from_backend(Arc::clone(&repo)),
            Arc::new(FixedClock(today())),
            8,
        );

        let created = coordinator
            .create_transaction(new_expense("Groceries", date(2025, 3, 12)))
            .await
            .unwrap();

        assert!(store.is_empty());
        assert_eq!(repo.write_count(), 1);
        assert!(created.user_id.is_some());
    }

    #[tokio::test]
    async fn test_pending_ids_are_unique() {
        let fx = Fixture::new().await;

        let first = fx.coordinator.next_pending_id();
        let second = fx.coordinator.next_pending_id();

        assert!(second.0 > first.0);
    }

    #[tokio::test]
    async fn test_fetch_started_before_create_does_not_hide_it() {
        let fx = Fixture::new().await;
        fx.store.invalidate_keys(&[march()]);
        let stale = fx
            .repo
            .inner
            .list_by_month(MonthKey::new(2, 2025).unwrap())
            .await
            .unwrap();
        let release = Arc::new(Notify::new());

        let client = fx.queries.client().clone();
        let fetch = {
            let release = Arc::clone(&release);
            move || {
                let release = Arc::clone(&release);
                let stale = stale.clone();
                async move {
                    release.notified().await;
                    Ok(CachedValue::Transactions(stale))
                }
                .boxed()
            }
        };
        let fetching = tokio::spawn(async move { client.query(march(), fetch).await });
        while fx.queries.client().in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        let created = fx
            .coordinator
            .create_transaction(new_expense("Groceries", date(2025, 3, 12)))
            .await
            .unwrap();
        release.notify_one();
        fetching.await.unwrap().unwrap();

        assert!(fx.store.get(&march()).unwrap().invalidated);
        let listed = fx.queries.transactions_by_month(2, 2025).await.unwrap();
        assert!(listed.iter().any(|t| t.id == created.id));
        assert!(listed.iter().all(|t| !t.id.is_pending()));
    }

    #[tokio::test]
    async fn test_later_rollback_keeps_earlier_success_invalidated() {
        let fx = Fixture::new().await;
        fx.repo.queue_outcomes(&[false, true]);
        let gate = fx.repo.gate.lock().await;

        let first = spawn_create(&fx, "Groceries", date(2025, 3, 12)).await;
        let second = spawn_create(&fx, "Coffee", date(2025, 3, 13)).await;
        assert_eq!(
            fx.descriptions(&march()),
            vec!["Coffee", "Groceries", "Rent", "Salary"]
        );

        drop(gate);
        let created = first.await.unwrap().unwrap();
        let error = second.await.unwrap().unwrap_err();

        // The second capture already held the first placeholder
        assert_eq!(error.operation, Operation::CreateTransaction);
        assert_eq!(fx.descriptions(&march()), vec!["Groceries", "Rent", "Salary"]);
        assert!(fx.store.get(&march()).unwrap().invalidated);

        let listed = fx.queries.transactions_by_month(2, 2025).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent", "Salary"]);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn test_earlier_rollback_then_later_success() {
        let fx = Fixture::new().await;
        let original = fx.store.get(&march()).unwrap();
        fx.repo.queue_outcomes(&[true, false]);
        let gate = fx.repo.gate.lock().await;

        let first = spawn_create(&fx, "Groceries", date(2025, 3, 12)).await;
        let second = spawn_create(&fx, "Coffee", date(2025, 3, 13)).await;

        drop(gate);
        first.await.unwrap().unwrap_err();
        let created = second.await.unwrap().unwrap();

        // Rolling back the first dropped the second placeholder too
        let entry = fx.store.get(&march()).unwrap();
        assert_eq!(entry.value, original.value);
        assert!(entry.invalidated);

        let listed = fx.queries.transactions_by_month(2, 2025).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Rent", "Salary"]);
        assert_eq!(listed[0].id, created.id);
    }
}
