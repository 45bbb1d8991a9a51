//! In-memory cache backend.

mod store;

pub use store::MemoryCacheStore;
