use std::fmt;

use chrono::NaiveDate;

use crate::ledger::{is_overdue, Transaction};
use crate::storage::MonthKey;

/// The entity collection a cached query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Transactions,
    Categories,
    PaymentMethods,
}

impl Collection {
    /// Returns the tag used as the first segment of rendered keys.
    pub fn tag(&self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Categories => "categories",
            Collection::PaymentMethods => "payment_methods",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of a cached query: collection plus filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Transactions dated within a month.
    TransactionsByMonth(MonthKey),
    /// Pending transactions dated before today.
    OverdueTransactions,
    /// Every category.
    Categories,
    /// Every payment method.
    PaymentMethods,
}

impl QueryKey {
    /// Returns the key for a zero-based month of a year.
    pub fn month(month: MonthKey) -> Self {
        QueryKey::TransactionsByMonth(month)
    }

    pub fn collection(&self) -> Collection {
        match self {
            QueryKey::TransactionsByMonth(_) | QueryKey::OverdueTransactions => {
                Collection::Transactions
            }
            QueryKey::Categories => Collection::Categories,
            QueryKey::PaymentMethods => Collection::PaymentMethods,
        }
    }

    /// Returns true if `transaction` belongs in this query's result.
    ///
    /// Non-transaction keys admit nothing.
    pub fn admits(&self, transaction: &Transaction, today: NaiveDate) -> bool {
        match self {
            QueryKey::TransactionsByMonth(month) => month.contains(transaction.date),
            QueryKey::OverdueTransactions => is_overdue(transaction, today),
            QueryKey::Categories | QueryKey::PaymentMethods => false,
        }
    }

    /// Returns the transaction keys a new record lands in.
    pub fn for_transaction(transaction: &Transaction, today: NaiveDate) -> Vec<QueryKey> {
        let mut keys = vec![QueryKey::TransactionsByMonth(MonthKey::containing(
            transaction.date,
        ))];
        if is_overdue(transaction, today) {
            keys.push(QueryKey::OverdueTransactions);
        }
        keys
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::TransactionsByMonth(month) => write!(
                f,
                "{}:month:{}:{}",
                self.collection(),
                month.month(),
                month.year()
            ),
            QueryKey::OverdueTransactions => write!(f, "{}:overdue", self.collection()),
            QueryKey::Categories | QueryKey::PaymentMethods => write!(f, "{}", self.collection()),
        }
    }
}
