//! Query layer: cached reads with request de-duplication.

mod client;
mod error;
mod ledger;

pub use client::{FetchResult, QueryClient};
pub use error::{QueryError, Result};
pub use ledger::LedgerQueries;
