//! Imperative shell for ledgersync.
//!
//! Cached reads and optimistic writes over the repository traits defined in
//! `ledgersync_core`.

pub mod cache;
pub mod config;
pub mod mock_data;
pub mod mutation;
pub mod query;
pub mod report;
pub mod state;
pub mod storage;
