//! Functional core for ledgersync.
//!
//! Pure domain types and functions for the finance ledger, plus the trait
//! seams (cache store, repositories, clock) the imperative shell implements.

pub mod cache;
pub mod clock;
pub mod form;
pub mod ledger;
pub mod money;
pub mod serde;
pub mod storage;
