//! Mutation layer: optimistic writes with rollback.

mod coordinator;
mod error;

pub use coordinator::{MutationCoordinator, Notification};
pub use error::{MutationError, Operation, Result};
