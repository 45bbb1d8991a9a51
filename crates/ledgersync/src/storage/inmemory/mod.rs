//! In-memory storage backend.
//!
//! Implements every repository trait over HashMaps wrapped in
//! `Arc<RwLock<_>>`. Used by the binary's demo data and by tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use ledgersync::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::default();
//! let categories = CategoryRepository::list(&repo).await?;
//! ```

mod repository;

pub use repository::InMemoryRepository;
