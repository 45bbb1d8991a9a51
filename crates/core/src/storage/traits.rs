use async_trait::async_trait;
use uuid::Uuid;

use crate::ledger::{
    Category, CategoryUpdate, NewCategory, NewPaymentMethod, NewTransaction, PaymentMethod,
    PaymentMethodUpdate, Transaction, TransactionUpdate,
};

use super::{MonthKey, Result};

/// Repository for transaction operations.
///
/// Ids passed to `update` and `delete` are repository ids; optimistic
/// placeholders never reach this boundary.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Gets the transactions dated within a month, newest date first.
    async fn list_by_month(&self, month: MonthKey) -> Result<Vec<Transaction>>;

    /// Gets pending transactions dated before today, oldest date first.
    async fn list_overdue(&self) -> Result<Vec<Transaction>>;

    /// Creates a transaction, assigning its id, owner and creation time.
    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction>;

    /// Applies a field update set and returns the full updated record.
    async fn update(&self, id: Uuid, update: &TransactionUpdate) -> Result<Transaction>;

    /// Deletes a transaction by its ID.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Repository for category operations.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Gets every category, ordered by name ascending.
    async fn list(&self) -> Result<Vec<Category>>;

    /// Creates a new category.
    async fn create(&self, category: &NewCategory) -> Result<Category>;

    /// Updates an existing category.
    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category>;

    /// Deletes a category by its ID. Transactions referencing it are left as is.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Repository for payment method operations.
#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    /// Gets every payment method, ordered by name ascending.
    async fn list(&self) -> Result<Vec<PaymentMethod>>;

    /// Creates a new payment method.
    async fn create(&self, method: &NewPaymentMethod) -> Result<PaymentMethod>;

    /// Updates an existing payment method.
    async fn update(&self, id: Uuid, update: &PaymentMethodUpdate) -> Result<PaymentMethod>;

    /// Deletes a payment method by its ID.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
