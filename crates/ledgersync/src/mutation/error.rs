use std::fmt;

use thiserror::Error;

use ledgersync_core::storage::RepositoryError;

/// A write the coordinator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreatePaymentMethod,
    UpdatePaymentMethod,
    DeletePaymentMethod,
}

impl Operation {
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::CreateTransaction
            | Operation::CreateCategory
            | Operation::CreatePaymentMethod => "create",
            Operation::UpdateTransaction
            | Operation::UpdateCategory
            | Operation::UpdatePaymentMethod => "update",
            Operation::DeleteTransaction
            | Operation::DeleteCategory
            | Operation::DeletePaymentMethod => "delete",
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            Operation::CreateTransaction
            | Operation::UpdateTransaction
            | Operation::DeleteTransaction => "transaction",
            Operation::CreateCategory | Operation::UpdateCategory | Operation::DeleteCategory => {
                "category"
            }
            Operation::CreatePaymentMethod
            | Operation::UpdatePaymentMethod
            | Operation::DeletePaymentMethod => "payment method",
        }
    }

    /// User-facing message shown when the operation is rolled back.
    pub fn failure_message(&self) -> String {
        format!("Failed to {} {}, please retry", self.verb(), self.entity())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.entity())
    }
}

/// A repository failure surfaced after the optimistic change was rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MutationError {
    pub operation: Operation,
    pub message: String,
    #[source]
    pub source: RepositoryError,
}

impl MutationError {
    pub fn new(operation: Operation, source: RepositoryError) -> Self {
        Self {
            operation,
            message: operation.failure_message(),
            source,
        }
    }
}

/// Result type for mutations.
pub type Result<T> = std::result::Result<T, MutationError>;
