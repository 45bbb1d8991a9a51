//! Derived aggregations over a period's transactions.
//!
//! Pure functions, recomputed from whatever the cache currently holds.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::types::{Transaction, TransactionStatus, TransactionType};

/// Income, expense and balance totals for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

impl Summary {
    fn from_totals(total_income: Decimal, total_expenses: Decimal) -> Self {
        Self {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
        }
    }

    /// Returns true if income covers expenses.
    pub fn is_positive(&self) -> bool {
        self.balance >= Decimal::ZERO
    }
}

/// Sums the amounts of the given type.
pub fn total(transactions: &[Transaction], kind: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

/// Totals over every transaction, paid or not.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    Summary::from_totals(
        total(transactions, TransactionType::Income),
        total(transactions, TransactionType::Expense),
    )
}

/// Totals over paid transactions only: the money that actually moved.
pub fn summarize_paid(transactions: &[Transaction]) -> Summary {
    let paid: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.status == TransactionStatus::Paid)
        .cloned()
        .collect();
    summarize(&paid)
}

/// One slice of a per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// `None` collects transactions without a category.
    pub category_id: Option<Uuid>,
    pub total: Decimal,
    pub count: usize,
}

/// Totals per category for one transaction type, largest first.
pub fn totals_by_category(transactions: &[Transaction], kind: TransactionType) -> Vec<CategoryTotal> {
    let mut grouped: HashMap<Option<Uuid>, (Decimal, usize)> = HashMap::new();

    for tx in transactions.iter().filter(|tx| tx.kind == kind) {
        let slot = grouped.entry(tx.category_id).or_insert((Decimal::ZERO, 0));
        slot.0 += tx.amount;
        slot.1 += 1;
    }

    let mut result: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(category_id, (total, count))| CategoryTotal {
            category_id,
            total,
            count,
        })
        .collect();

    // Ties are broken by id so the order is deterministic
    result.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    result
}
