use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token identifying an optimistic placeholder record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingId(pub u64);

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

/// Identity of a ledger record.
///
/// Records returned by a repository carry a `Real` id. Records inserted into
/// the cache before the repository has answered carry a `Pending` id, which
/// no repository operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RecordId {
    Real(Uuid),
    Pending(PendingId),
}

impl RecordId {
    /// Returns the repository id, or `None` for a placeholder.
    pub fn real(&self) -> Option<Uuid> {
        match self {
            RecordId::Real(id) => Some(*id),
            RecordId::Pending(_) => None,
        }
    }

    /// Returns true if this id belongs to an unsettled placeholder.
    pub fn is_pending(&self) -> bool {
        matches!(self, RecordId::Pending(_))
    }

    /// Returns true if this id is the given repository id.
    pub fn is(&self, id: Uuid) -> bool {
        self.real() == Some(id)
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        RecordId::Real(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Real(id) => write!(f, "{id}"),
            RecordId::Pending(token) => write!(f, "{token}"),
        }
    }
}

/// Direction of money flow. Fixed when a transaction is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

/// Settlement state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Paid,
}

impl TransactionStatus {
    /// Returns the opposite status, as flipped by the paid checkbox.
    pub fn toggled(self) -> Self {
        match self {
            TransactionStatus::Pending => TransactionStatus::Paid,
            TransactionStatus::Paid => TransactionStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
        }
    }
}

/// The party responsible for a transaction. Display and filtering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    A,
    B,
}

/// A financial ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub category_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub profile: Option<Profile>,
    /// Owner assigned by the repository. `None` only on placeholders.
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a pending transaction with a fresh repository id.
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
        kind: TransactionType,
    ) -> Self {
        Self {
            id: RecordId::Real(Uuid::new_v4()),
            description: description.into(),
            amount,
            date,
            kind,
            status: TransactionStatus::Pending,
            category_id: None,
            payment_method_id: None,
            profile: None,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    /// Creates an income transaction.
    pub fn income(description: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Self::new(description, amount, date, TransactionType::Income)
    }

    /// Creates an expense transaction.
    pub fn expense(description: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Self::new(description, amount, date, TransactionType::Expense)
    }

    /// Sets a specific ID for this transaction (useful for testing).
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn paid(self) -> Self {
        self.with_status(TransactionStatus::Paid)
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_payment_method(mut self, payment_method_id: Uuid) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }
}

/// A user-defined grouping for transactions of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Symbolic icon name, resolved by the presentation layer.
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: TransactionType) -> Self {
        Self {
            id: RecordId::Real(Uuid::new_v4()),
            name: name.into(),
            kind,
            icon: None,
            color: None,
        }
    }

    /// Sets a specific ID for this category (useful for testing).
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A way of paying, e.g. a card or an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: RecordId,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl PaymentMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::Real(Uuid::new_v4()),
            name: name.into(),
            icon: None,
            color: None,
        }
    }

    /// Sets a specific ID for this payment method (useful for testing).
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Access to the identity of any ledger record.
pub trait Record {
    fn record_id(&self) -> &RecordId;
}

impl Record for Transaction {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

impl Record for Category {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

impl Record for PaymentMethod {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
}
