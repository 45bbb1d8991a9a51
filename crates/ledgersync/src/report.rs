//! Monthly overview built from cached queries.

use std::fmt::Write as _;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use ledgersync_core::ledger::{
    category_label, find_payment_method, overdue, summarize, summarize_paid, totals_by_category,
    Category, PaymentMethod, Summary, Transaction, TransactionType,
};
use ledgersync_core::money::CurrencyFormat;
use ledgersync_core::storage::MonthKey;

use crate::query::Result;
use crate::state::LedgerState;

/// Expense total for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryExpense {
    pub label: String,
    pub total: Decimal,
}

/// Totals and lists shown for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub month: MonthKey,
    pub today: NaiveDate,
    pub transactions: Vec<Transaction>,
    pub overdue: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub payment_methods: Vec<PaymentMethod>,
}

impl MonthlyReport {
    /// Loads the month plus the lookups needed to label it.
    pub async fn load(state: &LedgerState, month: MonthKey) -> Result<Self> {
        let transactions = state
            .queries
            .transactions_by_month(month.month(), month.year())
            .await?;
        let overdue = state.queries.overdue_transactions().await?;
        let categories = state.queries.categories().await?;
        let payment_methods = state.queries.payment_methods().await?;

        Ok(Self {
            month,
            today: state.clock.today(),
            transactions,
            overdue,
            categories,
            payment_methods,
        })
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.transactions)
    }

    /// Totals counting only settled transactions.
    pub fn paid_summary(&self) -> Summary {
        summarize_paid(&self.transactions)
    }

    /// Expense totals labeled by category, largest first.
    pub fn expenses_by_category(&self) -> Vec<CategoryExpense> {
        totals_by_category(&self.transactions, TransactionType::Expense)
            .into_iter()
            .map(|total| CategoryExpense {
                label: category_label(total.category_id, &self.categories).to_string(),
                total: total.total,
            })
            .collect()
    }

    /// Machine-readable form of the report.
    pub fn to_json(&self) -> Value {
        json!({
            "month": self.month.to_string(),
            "summary": self.summary(),
            "paid": self.paid_summary(),
            "expenses_by_category": self.expenses_by_category(),
            "transactions": self.transactions,
            "overdue": overdue(&self.overdue, self.today),
        })
    }

    /// Renders the report as plain text.
    pub fn render(&self, format: &CurrencyFormat) -> String {
        let mut out = String::new();
        let summary = self.summary();
        let paid = self.paid_summary();

        let _ = writeln!(out, "Ledger for {}", self.month);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  Income    {:>16}   paid {:>16}",
            format.format(summary.total_income),
            format.format(paid.total_income)
        );
        let _ = writeln!(
            out,
            "  Expenses  {:>16}   paid {:>16}",
            format.format(summary.total_expenses),
            format.format(paid.total_expenses)
        );
        let _ = writeln!(
            out,
            "  Balance   {:>16}   paid {:>16}",
            format.format_signed(summary.balance),
            format.format_signed(paid.balance)
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "Transactions");
        for tx in &self.transactions {
            let signed = match tx.kind {
                TransactionType::Income => tx.amount,
                TransactionType::Expense => -tx.amount,
            };
            let method = find_payment_method(tx.payment_method_id, &self.payment_methods)
                .map(|m| m.name.as_str())
                .unwrap_or("-");
            let _ = writeln!(
                out,
                "  {}  [{}] {:<24} {:>16}  {:<14} {}",
                tx.date,
                if tx.is_paid() { "x" } else { " " },
                tx.description,
                format.format_signed(signed),
                category_label(tx.category_id, &self.categories),
                method
            );
        }

        let by_category = self.expenses_by_category();
        if !by_category.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Expenses by category");
            for expense in by_category {
                let _ = writeln!(
                    out,
                    "  {:<16} {:>16}",
                    expense.label,
                    format.format(expense.total)
                );
            }
        }

        let late = overdue(&self.overdue, self.today);
        if !late.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Overdue");
            for tx in late {
                let _ = writeln!(
                    out,
                    "  {}  {:<24} {:>16}",
                    tx.date,
                    tx.description,
                    format.format(tx.amount)
                );
            }
        }

        out
    }
}
