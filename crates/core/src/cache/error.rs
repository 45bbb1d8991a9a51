use thiserror::Error;

use super::Collection;

/// Errors that can occur when reading typed values out of the cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cached value under {key} holds {found}, expected {expected}")]
    Mismatch {
        key: String,
        expected: Collection,
        found: Collection,
    },
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display() {
        let error = CacheError::Mismatch {
            key: "categories".to_string(),
            expected: Collection::Categories,
            found: Collection::PaymentMethods,
        };
        assert_eq!(
            error.to_string(),
            "Cached value under categories holds payment_methods, expected categories"
        );
    }
}
