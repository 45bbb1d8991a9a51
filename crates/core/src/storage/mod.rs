mod error;
mod traits;
mod types;

pub use error::{PeriodError, RepositoryError, Result};
pub use traits::{CategoryRepository, PaymentMethodRepository, TransactionRepository};
pub use types::MonthKey;
