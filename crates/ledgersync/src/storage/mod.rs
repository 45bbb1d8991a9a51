//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `ledgersync_core::storage`, plus the bundle of trait objects the query
//! and mutation layers share.

use std::sync::Arc;

use ledgersync_core::storage::{
    CategoryRepository, PaymentMethodRepository, TransactionRepository,
};

pub mod inmemory;

pub use inmemory::InMemoryRepository;

/// The repositories backing the ledger, as trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub transactions: Arc<dyn TransactionRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub payment_methods: Arc<dyn PaymentMethodRepository>,
}

impl Repositories {
    /// Uses one backend for every collection.
    pub fn from_backend<R>(backend: Arc<R>) -> Self
    where
        R: TransactionRepository + CategoryRepository + PaymentMethodRepository + 'static,
    {
        Self {
            transactions: backend.clone(),
            categories: backend.clone(),
            payment_methods: backend,
        }
    }
}
