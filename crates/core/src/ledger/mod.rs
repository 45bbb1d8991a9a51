mod error;
mod operations;
mod requests;
mod summary;
mod types;

pub use error::ValidationError;
pub use operations::{
    category_label, compare_newest_first, compare_oldest_first, filter_by_profile,
    filter_by_type, filter_categories_by_type, find_payment_method, insert_sorted, is_overdue,
    overdue, remove_by_id, sort_categories_by_name, sort_newest_first, sort_oldest_first,
    sort_payment_methods_by_name, UNCATEGORIZED,
};
pub use requests::{
    Amount, CategoryUpdate, Description, Name, NewCategory, NewPaymentMethod, NewTransaction,
    PaymentMethodUpdate, TransactionUpdate,
};
pub use summary::{summarize, summarize_paid, total, totals_by_category, CategoryTotal, Summary};
pub use types::{
    Category, PaymentMethod, PendingId, Profile, Record, RecordId, Transaction, TransactionStatus,
    TransactionType,
};
