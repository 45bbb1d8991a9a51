//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use ledgersync_core::clock::{Clock, SystemClock};
use ledgersync_core::ledger::{
    is_overdue, sort_categories_by_name, sort_newest_first, sort_oldest_first,
    sort_payment_methods_by_name, Category, CategoryUpdate, NewCategory, NewPaymentMethod,
    NewTransaction, PaymentMethod, PaymentMethodUpdate, RecordId, Transaction, TransactionUpdate,
};
use ledgersync_core::storage::{
    CategoryRepository, MonthKey, PaymentMethodRepository, RepositoryError, Result,
    TransactionRepository,
};

/// In-memory storage backend.
///
/// Uses HashMaps wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Every record is owned by the repository's user. Data is not persisted
/// and will be lost when the repository is dropped.
#[derive(Clone)]
pub struct InMemoryRepository {
    user_id: Uuid,
    clock: Arc<dyn Clock>,
    transactions: Arc<RwLock<HashMap<Uuid, Transaction>>>,
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    payment_methods: Arc<RwLock<HashMap<Uuid, PaymentMethod>>>,
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new(Uuid::new_v4(), Arc::new(SystemClock))
    }
}

impl InMemoryRepository {
    /// Creates an empty repository owned by `user_id`.
    pub fn new(user_id: Uuid, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_id,
            clock,
            transactions: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(HashMap::new())),
            payment_methods: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Stores already materialized records as is. Records without a real
    /// id are skipped.
    pub async fn seed(
        &self,
        transactions: Vec<Transaction>,
        categories: Vec<Category>,
        payment_methods: Vec<PaymentMethod>,
    ) {
        {
            let mut store = self.transactions.write().await;
            for transaction in transactions {
                if let Some(id) = transaction.id.real() {
                    store.insert(id, transaction);
                }
            }
        }
        {
            let mut store = self.categories.write().await;
            for category in categories {
                if let Some(id) = category.id.real() {
                    store.insert(id, category);
                }
            }
        }
        let mut store = self.payment_methods.write().await;
        for method in payment_methods {
            if let Some(id) = method.id.real() {
                store.insert(id, method);
            }
        }
    }
}

fn not_found(entity_type: &'static str, id: Uuid) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type,
        id: id.to_string(),
    }
}

#[async_trait]
impl TransactionRepository for InMemoryRepository {
    async fn list_by_month(&self, month: MonthKey) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut result: Vec<Transaction> = transactions
            .values()
            .filter(|tx| month.contains(tx.date))
            .cloned()
            .collect();
        sort_newest_first(&mut result);
        Ok(result)
    }

    async fn list_overdue(&self) -> Result<Vec<Transaction>> {
        let today = self.clock.today();
        let transactions = self.transactions.read().await;
        let mut result: Vec<Transaction> = transactions
            .values()
            .filter(|tx| is_overdue(tx, today))
            .cloned()
            .collect();
        sort_oldest_first(&mut result);
        Ok(result)
    }

    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let id = Uuid::new_v4();
        let created = transaction
            .clone()
            .into_transaction(RecordId::Real(id), Some(self.user_id));

        let mut transactions = self.transactions.write().await;
        transactions.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, update: &TransactionUpdate) -> Result<Transaction> {
        let mut transactions = self.transactions.write().await;
        let current = transactions
            .get_mut(&id)
            .ok_or_else(|| not_found("Transaction", id))?;
        *current = update.apply(current);
        Ok(current.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if transactions.remove(&id).is_none() {
            return Err(not_found("Transaction", id));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        let categories = self.categories.read().await;
        let mut result: Vec<Category> = categories.values().cloned().collect();
        sort_categories_by_name(&mut result);
        Ok(result)
    }

    async fn create(&self, category: &NewCategory) -> Result<Category> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.name == category.name.as_str() && c.kind == category.kind)
        {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Category",
                id: category.name.as_str().to_string(),
            });
        }

        let id = Uuid::new_v4();
        let created = category.clone().into_category(RecordId::Real(id));
        categories.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category> {
        let mut categories = self.categories.write().await;
        let current = categories
            .get_mut(&id)
            .ok_or_else(|| not_found("Category", id))?;
        *current = update.apply(current);
        Ok(current.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut categories = self.categories.write().await;
        if categories.remove(&id).is_none() {
            return Err(not_found("Category", id));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentMethodRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<PaymentMethod>> {
        let methods = self.payment_methods.read().await;
        let mut result: Vec<PaymentMethod> = methods.values().cloned().collect();
        sort_payment_methods_by_name(&mut result);
        Ok(result)
    }

    async fn create(&self, method: &NewPaymentMethod) -> Result<PaymentMethod> {
        let id = Uuid::new_v4();
        let created = method.clone().into_payment_method(RecordId::Real(id));

        let mut methods = self.payment_methods.write().await;
        methods.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, update: &PaymentMethodUpdate) -> Result<PaymentMethod> {
        let mut methods = self.payment_methods.write().await;
        let current = methods
            .get_mut(&id)
            .ok_or_else(|| not_found("PaymentMethod", id))?;
        *current = update.apply(current);
        Ok(current.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut methods = self.payment_methods.write().await;
        if methods.remove(&id).is_none() {
            return Err(not_found("PaymentMethod", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgersync_core::clock::FixedClock;
    use ledgersync_core::ledger::{
        Amount, Description, Name, PendingId, TransactionStatus, TransactionType,
    };
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repo() -> InMemoryRepository {
        InMemoryRepository::new(Uuid::new_v4(), Arc::new(FixedClock(date(2025, 3, 15))))
    }

    fn new_expense(description: &str, on: NaiveDate) -> NewTransaction {
        NewTransaction::new(
            Description::new(description).unwrap(),
            Amount::new(dec!(100)).unwrap(),
            on,
            TransactionType::Expense,
        )
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_owner() {
        let repo = repo();

        let created = TransactionRepository::create(&repo, &new_expense("Rent", date(2025, 3, 5)))
            .await
            .unwrap();

        assert!(created.id.real().is_some());
        assert_eq!(created.user_id, Some(repo.user_id()));
        assert_eq!(created.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_by_month_newest_first() {
        let repo = repo();
        for (name, on) in [
            ("Early", date(2025, 3, 1)),
            ("Late", date(2025, 3, 20)),
            ("April", date(2025, 4, 1)),
        ] {
            TransactionRepository::create(&repo, &new_expense(name, on))
                .await
                .unwrap();
        }

        let march = repo
            .list_by_month(MonthKey::new(2, 2025).unwrap())
            .await
            .unwrap();

        let names: Vec<&str> = march.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["Late", "Early"]);
    }

    #[tokio::test]
    async fn test_list_overdue_boundary() {
        let repo = repo();
        for (name, on) in [
            ("Today", date(2025, 3, 15)),
            ("Yesterday", date(2025, 3, 14)),
            ("Older", date(2025, 2, 1)),
        ] {
            TransactionRepository::create(&repo, &new_expense(name, on))
                .await
                .unwrap();
        }
        TransactionRepository::create(
            &repo,
            &new_expense("Paid", date(2025, 3, 1)).with_status(TransactionStatus::Paid),
        )
        .await
        .unwrap();

        let overdue = repo.list_overdue().await.unwrap();

        let names: Vec<&str> = overdue.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["Older", "Yesterday"]);
    }

    #[tokio::test]
    async fn test_update_applies_fields() {
        let repo = repo();
        let created = TransactionRepository::create(&repo, &new_expense("Rent", date(2025, 3, 5)))
            .await
            .unwrap();
        let id = created.id.real().unwrap();

        let updated = TransactionRepository::update(
            &repo,
            id,
            &TransactionUpdate::status_only(TransactionStatus::Paid),
        )
        .await
        .unwrap();

        assert!(updated.is_paid());
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = repo();
        let id = Uuid::new_v4();

        let update = TransactionRepository::update(&repo, id, &TransactionUpdate::new()).await;
        let delete = TransactionRepository::delete(&repo, id).await;

        assert!(matches!(update, Err(RepositoryError::NotFound { .. })));
        assert!(matches!(delete, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_categories_sorted_and_unique() {
        let repo = repo();
        for name in ["Transport", "Food"] {
            CategoryRepository::create(
                &repo,
                &NewCategory::new(Name::new(name).unwrap(), TransactionType::Expense),
            )
            .await
            .unwrap();
        }

        let duplicate = CategoryRepository::create(
            &repo,
            &NewCategory::new(Name::new("Food").unwrap(), TransactionType::Expense),
        )
        .await;
        let names: Vec<String> = CategoryRepository::list(&repo)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert!(matches!(
            duplicate,
            Err(RepositoryError::AlreadyExists { .. })
        ));
        assert_eq!(names, vec!["Food", "Transport"]);
    }

    #[tokio::test]
    async fn test_delete_category_leaves_references() {
        let repo = repo();
        let food = CategoryRepository::create(
            &repo,
            &NewCategory::new(Name::new("Food").unwrap(), TransactionType::Expense),
        )
        .await
        .unwrap();
        let food_id = food.id.real().unwrap();
        let lunch = TransactionRepository::create(
            &repo,
            &new_expense("Lunch", date(2025, 3, 5)).with_category(food_id),
        )
        .await
        .unwrap();

        CategoryRepository::delete(&repo, food_id).await.unwrap();

        let march = repo
            .list_by_month(MonthKey::new(2, 2025).unwrap())
            .await
            .unwrap();
        assert_eq!(march[0].id, lunch.id);
        assert_eq!(march[0].category_id, Some(food_id));
    }

    #[tokio::test]
    async fn test_seed_skips_placeholders() {
        let repo = repo();
        let real = Transaction::expense("Rent", dec!(100), date(2025, 3, 5)).with_id(Uuid::new_v4());
        let placeholder = Transaction::expense("Draft", dec!(100), date(2025, 3, 6))
            .with_id(RecordId::Pending(PendingId(1)));

        repo.seed(vec![real.clone(), placeholder], vec![], vec![])
            .await;

        let march = repo
            .list_by_month(MonthKey::new(2, 2025).unwrap())
            .await
            .unwrap();
        assert_eq!(march, vec![real]);
    }
}
