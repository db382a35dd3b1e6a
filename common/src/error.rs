//! Error types for shared rate types.

use thiserror::Error;

/// Errors raised while building shared rate values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Currency code is empty or contains whitespace.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    /// Rate is not a finite, strictly positive number.
    #[error("Invalid rate {rate} for {code}")]
    InvalidRate { code: String, rate: f64 },
}

/// Result type for common operations.
pub type Result<T> = std::result::Result<T, CommonError>;
