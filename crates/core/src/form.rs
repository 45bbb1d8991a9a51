//! Raw form payloads and their validation into write payloads.
//!
//! Forms carry user input as typed: amounts and dates are strings, selects
//! submit blank strings for "no selection". Validation happens here so that
//! only well-formed payloads reach the mutation layer.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::ledger::{
    Amount, CategoryUpdate, Description, Name, NewCategory, NewPaymentMethod, NewTransaction,
    PaymentMethodUpdate, Profile, TransactionStatus, TransactionType, TransactionUpdate,
    ValidationError,
};
use crate::money::CurrencyFormat;
use crate::serde::{deserialize_optional_string, deserialize_optional_uuid};

/// Transaction create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    pub description: String,
    /// Plain decimal (`1234.50`) or formatted currency (`R$ 1.234,50`).
    pub amount: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub payment_method_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub profile: Option<String>,
}

impl TransactionForm {
    /// Validates the form into a create payload.
    pub fn validate(&self, format: &CurrencyFormat) -> Result<NewTransaction, ValidationError> {
        let description = Description::new(self.description.trim())?;
        let amount = parse_amount(&self.amount, format)?;
        let date = parse_date(&self.date)?;
        let kind = parse_type(&self.kind)?;
        let profile = self.profile.as_deref().map(parse_profile).transpose()?;

        let mut transaction = NewTransaction::new(description, amount, date, kind)
            .with_status(self.status());
        transaction.category_id = self.category_id;
        transaction.payment_method_id = self.payment_method_id;
        transaction.profile = profile;
        Ok(transaction)
    }

    /// Validates an edit form into a full update set.
    ///
    /// Every field except the type is written back; blank selects clear
    /// their reference.
    pub fn validate_update(
        &self,
        format: &CurrencyFormat,
    ) -> Result<TransactionUpdate, ValidationError> {
        let profile = self.profile.as_deref().map(parse_profile).transpose()?;

        Ok(TransactionUpdate::new()
            .with_description(Description::new(self.description.trim())?)
            .with_amount(parse_amount(&self.amount, format)?)
            .with_date(parse_date(&self.date)?)
            .with_status(self.status())
            .with_category(self.category_id)
            .with_payment_method(self.payment_method_id)
            .with_profile(profile))
    }

    fn status(&self) -> TransactionStatus {
        if self.paid {
            TransactionStatus::Paid
        } else {
            TransactionStatus::Pending
        }
    }
}

/// Category create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub color: Option<String>,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<NewCategory, ValidationError> {
        let mut category = NewCategory::new(Name::new(self.name.trim())?, parse_type(&self.kind)?);
        category.icon = self.icon.clone();
        category.color = self.color.clone();
        Ok(category)
    }

    /// The category type is fixed, so edits only carry name, icon and color.
    pub fn validate_update(&self) -> Result<CategoryUpdate, ValidationError> {
        Ok(CategoryUpdate::new()
            .with_name(Name::new(self.name.trim())?)
            .with_icon(self.icon.clone())
            .with_color(self.color.clone()))
    }
}

/// Payment method create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMethodForm {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub color: Option<String>,
}

impl PaymentMethodForm {
    pub fn validate(&self) -> Result<NewPaymentMethod, ValidationError> {
        let mut method = NewPaymentMethod::new(Name::new(self.name.trim())?);
        method.icon = self.icon.clone();
        method.color = self.color.clone();
        Ok(method)
    }

    pub fn validate_update(&self) -> Result<PaymentMethodUpdate, ValidationError> {
        Ok(PaymentMethodUpdate::new()
            .with_name(Name::new(self.name.trim())?)
            .with_icon(self.icon.clone())
            .with_color(self.color.clone()))
    }
}

/// Parses a plain decimal first, then the formatted currency shape.
/// Locale-shaped input (`R$ 12`, `1.234,50`, `1.500`) goes through the
/// currency format. Anything else is a plain decimal with `.` as the point.
fn parse_amount(raw: &str, format: &CurrencyFormat) -> Result<Amount, ValidationError> {
    let raw = raw.trim();
    let value = if is_localized(raw, format) {
        format.parse(raw).ok()
    } else {
        Decimal::from_str(raw).ok()
    }
    .ok_or_else(|| ValidationError::InvalidAmount(raw.to_string()))?;
    Amount::new(value)
}

fn is_localized(raw: &str, format: &CurrencyFormat) -> bool {
    if (!format.symbol.is_empty() && raw.contains(format.symbol.as_str()))
        || raw.contains(format.decimal_separator)
    {
        return true;
    }

    // Grouped only if every part after a separator has exactly three digits
    let mut groups = raw.split(format.thousands_separator).skip(1).peekable();
    groups.peek().is_some()
        && groups.all(|group| group.len() == 3 && group.chars().all(|c| c.is_ascii_digit()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

fn parse_type(raw: &str) -> Result<TransactionType, ValidationError> {
    match raw.trim() {
        "income" => Ok(TransactionType::Income),
        "expense" => Ok(TransactionType::Expense),
        other => Err(ValidationError::InvalidType(other.to_string())),
    }
}

fn parse_profile(raw: &str) -> Result<Profile, ValidationError> {
    match raw.trim() {
        "A" | "a" => Ok(Profile::A),
        "B" | "b" => Ok(Profile::B),
        other => Err(ValidationError::InvalidProfile(other.to_string())),
    }
}
