use std::cmp::Ordering;

use chrono::NaiveDate;
use uuid::Uuid;

use super::types::{
    Category, PaymentMethod, Profile, RecordId, Transaction, TransactionStatus, TransactionType,
};

/// Label shown for a missing or dangling category reference.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Returns true if the transaction is unpaid and dated before `today`.
///
/// A transaction dated `today` is not overdue yet.
pub fn is_overdue(transaction: &Transaction, today: NaiveDate) -> bool {
    transaction.status == TransactionStatus::Pending && transaction.date < today
}

/// Returns the overdue transactions, oldest first.
pub fn overdue(transactions: &[Transaction], today: NaiveDate) -> Vec<&Transaction> {
    let mut result: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| is_overdue(tx, today))
        .collect();
    result.sort_by(|a, b| compare_oldest_first(a, b));
    result
}

/// Filters transactions by type.
pub fn filter_by_type(transactions: &[Transaction], kind: TransactionType) -> Vec<&Transaction> {
    transactions.iter().filter(|tx| tx.kind == kind).collect()
}

/// Filters transactions by responsible profile.
pub fn filter_by_profile(transactions: &[Transaction], profile: Profile) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.profile == Some(profile))
        .collect()
}

/// Returns the categories a form for `kind` may offer.
pub fn filter_categories_by_type(categories: &[Category], kind: TransactionType) -> Vec<&Category> {
    categories.iter().filter(|c| c.kind == kind).collect()
}

/// Resolves the display name for a category reference.
///
/// References to categories that no longer exist render as uncategorized.
pub fn category_label(category_id: Option<Uuid>, categories: &[Category]) -> &str {
    category_id
        .and_then(|id| categories.iter().find(|c| c.id.is(id)))
        .map(|c| c.name.as_str())
        .unwrap_or(UNCATEGORIZED)
}

/// Resolves a payment method reference, if it still exists.
pub fn find_payment_method(
    payment_method_id: Option<Uuid>,
    methods: &[PaymentMethod],
) -> Option<&PaymentMethod> {
    let id = payment_method_id?;
    methods.iter().find(|m| m.id.is(id))
}

/// Month list order: newest date first, then newest creation first.
pub fn compare_newest_first(a: &Transaction, b: &Transaction) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Overdue list order: oldest date first.
pub fn compare_oldest_first(a: &Transaction, b: &Transaction) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Sorts transactions newest first.
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(compare_newest_first);
}

/// Sorts transactions oldest first.
pub fn sort_oldest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(compare_oldest_first);
}

/// Sorts categories by name, ascending.
pub fn sort_categories_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Sorts payment methods by name, ascending.
pub fn sort_payment_methods_by_name(methods: &mut [PaymentMethod]) {
    methods.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Inserts `item` before the first element that orders after it.
pub fn insert_sorted<T, F>(items: &mut Vec<T>, item: T, compare: F)
where
    F: Fn(&T, &T) -> Ordering,
{
    let position = items
        .iter()
        .position(|existing| compare(&item, existing) == Ordering::Less)
        .unwrap_or(items.len());
    items.insert(position, item);
}

/// Removes every record with the given id. Returns true if any was removed.
pub fn remove_by_id<T: super::types::Record>(items: &mut Vec<T>, id: &RecordId) -> bool {
    let before = items.len();
    items.retain(|item| item.record_id() != id);
    items.len() != before
}
