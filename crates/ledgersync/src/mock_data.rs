use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use ledgersync_core::ledger::{Category, PaymentMethod, Profile, Transaction, TransactionType};
use ledgersync_core::storage::MonthKey;

/// Generates a demo ledger for the month containing `today` and the month
/// before it. Some earlier bills are left unpaid so the overdue list is not
/// empty.
pub fn demo_ledger(today: NaiveDate) -> (Vec<Transaction>, Vec<Category>, Vec<PaymentMethod>) {
    let salary = Category::new("Salary", TransactionType::Income)
        .with_icon("briefcase")
        .with_color("#10B981");
    let freelance = Category::new("Freelance", TransactionType::Income)
        .with_icon("laptop")
        .with_color("#3B82F6");
    let housing = Category::new("Housing", TransactionType::Expense)
        .with_icon("home")
        .with_color("#8B5CF6");
    let groceries = Category::new("Groceries", TransactionType::Expense)
        .with_icon("cart")
        .with_color("#F59E0B");
    let transport = Category::new("Transport", TransactionType::Expense)
        .with_icon("car")
        .with_color("#EF4444");
    let utilities = Category::new("Utilities", TransactionType::Expense).with_icon("bolt");

    let pix = PaymentMethod::new("Pix").with_icon("qr-code");
    let card = PaymentMethod::new("Credit card").with_icon("credit-card");
    let cash = PaymentMethod::new("Cash").with_icon("banknote");

    let this_month = MonthKey::containing(today);
    let last_month = this_month.previous();
    // Days 1-28 exist in every month
    let on = |month: MonthKey, day: u64| {
        let first = month.first_day();
        first
            .checked_add_days(Days::new(day.clamp(1, 28) - 1))
            .unwrap_or(first)
    };
    let id = |record: &Category| record.id.real().unwrap_or_else(Uuid::nil);
    let method = |record: &PaymentMethod| record.id.real().unwrap_or_else(Uuid::nil);

    let mut transactions = Vec::new();
    for month in [last_month, this_month] {
        transactions.push(
            Transaction::income("Salary", Decimal::new(3500_00, 2), on(month, 5))
                .paid()
                .with_category(id(&salary))
                .with_payment_method(method(&pix))
                .with_profile(Profile::A),
        );
        transactions.push(
            Transaction::expense("Rent", Decimal::new(1500_00, 2), on(month, 10))
                .with_category(id(&housing))
                .with_payment_method(method(&pix))
                .with_profile(Profile::A),
        );
        transactions.push(
            Transaction::expense("Supermarket", Decimal::new(412_37, 2), on(month, 12))
                .paid()
                .with_category(id(&groceries))
                .with_payment_method(method(&card))
                .with_profile(Profile::B),
        );
        transactions.push(
            Transaction::expense("Electricity", Decimal::new(189_90, 2), on(month, 20))
                .with_category(id(&utilities))
                .with_payment_method(method(&pix)),
        );
    }

    // Last month's rent was paid on time
    if let Some(rent) = transactions
        .iter_mut()
        .find(|t| t.description == "Rent" && last_month.contains(t.date))
    {
        *rent = rent.clone().paid();
    }

    transactions.push(
        Transaction::income("Website project", Decimal::new(800_00, 2), on(this_month, 15))
            .with_category(id(&freelance))
            .with_payment_method(method(&pix))
            .with_profile(Profile::B),
    );
    transactions.push(
        Transaction::expense("Bus pass", Decimal::new(45_00, 2), on(this_month, 2))
            .paid()
            .with_category(id(&transport))
            .with_payment_method(method(&cash)),
    );

    (
        transactions,
        vec![salary, freelance, housing, groceries, transport, utilities],
        vec![pix, card, cash],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersync_core::ledger::{overdue, summarize};

    #[test]
    fn test_demo_ledger_covers_two_months() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 25).unwrap();
        let (transactions, categories, methods) = demo_ledger(today);

        let march = MonthKey::containing(today);
        let in_march: Vec<Transaction> = transactions
            .iter()
            .filter(|t| march.contains(t.date))
            .cloned()
            .collect();
        let in_february = transactions
            .iter()
            .filter(|t| march.previous().contains(t.date))
            .count();

        assert_eq!(in_march.len(), 6);
        assert_eq!(in_february, 4);
        assert_eq!(categories.len(), 6);
        assert_eq!(methods.len(), 3);
        assert_eq!(summarize(&in_march).total_income, Decimal::new(4300_00, 2));
    }

    #[test]
    fn test_demo_ledger_has_overdue_bills() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 25).unwrap();
        let (transactions, _, _) = demo_ledger(today);

        let names: Vec<&str> = overdue(&transactions, today)
            .into_iter()
            .map(|t| t.description.as_str())
            .collect();

        assert_eq!(names, vec!["Electricity", "Rent", "Website project", "Electricity"]);
    }
}
