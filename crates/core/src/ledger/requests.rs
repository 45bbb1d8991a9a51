//! Write payloads for ledger operations.
//!
//! Create payloads are built from validated values, so an instance of
//! [`NewTransaction`] or [`NewCategory`] already satisfies the form contract.
//! Update payloads are explicit field sets: each field the caller may change
//! has its own slot, and `None` means "leave as is".

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;
use super::types::{
    Category, PaymentMethod, PendingId, Profile, RecordId, Transaction, TransactionStatus,
    TransactionType,
};

const MAX_DESCRIPTION_CHARS: usize = 100;
const MAX_NAME_CHARS: usize = 50;

/// A non-empty transaction description of at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if value.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ValidationError::DescriptionTooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

/// A positive amount with at most two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if value.normalize().scale() > 2 {
            return Err(ValidationError::TooManyDecimals);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// A non-empty category or payment method name of at most 50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if value.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::NameTooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.0
    }
}

/// Payload for creating a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: Description,
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub payment_method_id: Option<Uuid>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl NewTransaction {
    /// Creates a pending transaction payload.
    pub fn new(
        description: Description,
        amount: Amount,
        date: NaiveDate,
        kind: TransactionType,
    ) -> Self {
        Self {
            description,
            amount,
            date,
            kind,
            status: TransactionStatus::Pending,
            category_id: None,
            payment_method_id: None,
            profile: None,
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
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

    /// Materializes the payload into a record with the given id and owner.
    pub fn into_transaction(self, id: RecordId, user_id: Option<Uuid>) -> Transaction {
        Transaction {
            id,
            description: self.description.into(),
            amount: self.amount.into(),
            date: self.date,
            kind: self.kind,
            status: self.status,
            category_id: self.category_id,
            payment_method_id: self.payment_method_id,
            profile: self.profile,
            user_id,
            created_at: Utc::now(),
        }
    }

    /// Builds the optimistic placeholder shown until the repository answers.
    pub fn to_placeholder(&self, token: PendingId) -> Transaction {
        self.clone().into_transaction(RecordId::Pending(token), None)
    }
}

/// Set of transaction fields to change.
///
/// Nullable references use `Option<Option<_>>`: the outer `Some` means the
/// field changes, the inner value is the new reference or `None` to clear it.
/// The transaction type is not part of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub category_id: Option<Option<Uuid>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub payment_method_id: Option<Option<Uuid>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub profile: Option<Option<Profile>>,
}

impl TransactionUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shape sent by the paid/pending toggle.
    pub fn status_only(status: TransactionStatus) -> Self {
        Self::new().with_status(status)
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category_id: Option<Uuid>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_payment_method(mut self, payment_method_id: Option<Uuid>) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Returns true if no field would change.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns a copy of `transaction` with this set applied.
    pub fn apply(&self, transaction: &Transaction) -> Transaction {
        let mut updated = transaction.clone();
        if let Some(description) = &self.description {
            updated.description = description.as_str().to_string();
        }
        if let Some(amount) = self.amount {
            updated.amount = amount.value();
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(category_id) = self.category_id {
            updated.category_id = category_id;
        }
        if let Some(payment_method_id) = self.payment_method_id {
            updated.payment_method_id = payment_method_id;
        }
        if let Some(profile) = self.profile {
            updated.profile = profile;
        }
        updated
    }
}

/// Payload for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: Name,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewCategory {
    pub fn new(name: Name, kind: TransactionType) -> Self {
        Self {
            name,
            kind,
            icon: None,
            color: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Materializes the payload into a record with the given id.
    pub fn into_category(self, id: RecordId) -> Category {
        Category {
            id,
            name: self.name.into(),
            kind: self.kind,
            icon: self.icon,
            color: self.color,
        }
    }
}

/// Set of category fields to change. The category type is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub icon: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub color: Option<Option<String>>,
}

impl CategoryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = Some(color);
        self
    }

    /// Returns a copy of `category` with this set applied.
    pub fn apply(&self, category: &Category) -> Category {
        let mut updated = category.clone();
        if let Some(name) = &self.name {
            updated.name = name.as_str().to_string();
        }
        if let Some(icon) = &self.icon {
            updated.icon = icon.clone();
        }
        if let Some(color) = &self.color {
            updated.color = color.clone();
        }
        updated
    }
}

/// Payload for creating a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewPaymentMethod {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            icon: None,
            color: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Materializes the payload into a record with the given id.
    pub fn into_payment_method(self, id: RecordId) -> PaymentMethod {
        PaymentMethod {
            id,
            name: self.name.into(),
            icon: self.icon,
            color: self.color,
        }
    }
}

/// Set of payment method fields to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub icon: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub color: Option<Option<String>>,
}

impl PaymentMethodUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = Some(color);
        self
    }

    /// Returns a copy of `method` with this set applied.
    pub fn apply(&self, method: &PaymentMethod) -> PaymentMethod {
        let mut updated = method.clone();
        if let Some(name) = &self.name {
            updated.name = name.as_str().to_string();
        }
        if let Some(icon) = &self.icon {
            updated.icon = icon.clone();
        }
        if let Some(color) = &self.color {
            updated.color = color.clone();
        }
        updated
    }
}
