use thiserror::Error;

/// Form-level validation failures, surfaced inline at the offending input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Description is required")]
    EmptyDescription,
    #[error("Description too long (max 100 characters)")]
    DescriptionTooLong,
    #[error("Amount must be positive")]
    NonPositiveAmount,
    #[error("Amount must have at most 2 decimal places")]
    TooManyDecimals,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Date must be in YYYY-MM-DD format: {0}")]
    InvalidDate(String),
    #[error("Name is required")]
    EmptyName,
    #[error("Name too long (max 50 characters)")]
    NameTooLong,
    #[error("Invalid transaction type: {0}")]
    InvalidType(String),
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl ValidationError {
    /// Returns the form field this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyDescription | ValidationError::DescriptionTooLong => {
                "description"
            }
            ValidationError::NonPositiveAmount
            | ValidationError::TooManyDecimals
            | ValidationError::InvalidAmount(_) => "amount",
            ValidationError::InvalidDate(_) => "date",
            ValidationError::EmptyName | ValidationError::NameTooLong => "name",
            ValidationError::InvalidType(_) => "type",
            ValidationError::InvalidProfile(_) => "profile",
            ValidationError::InvalidReference(_) => "reference",
        }
    }
}
