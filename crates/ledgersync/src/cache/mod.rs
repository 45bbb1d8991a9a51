//! Cache backend implementations.
//!
//! Concrete implementations of the `CacheStore` trait defined in
//! `ledgersync_core::cache`.

pub mod memory;

pub use memory::MemoryCacheStore;
