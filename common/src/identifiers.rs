//! Identifier types for currencies.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::{CommonError, Result};

/// A currency code as returned by the upstream provider.
///
/// Codes are ISO 4217-like but are not normalised: comparison is
/// case-sensitive, so `"usd"` and `"USD"` are different codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code without validation.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Create a currency code, rejecting empty codes and codes with whitespace.
    pub fn parse(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() || code.chars().any(char::is_whitespace) {
            return Err(CommonError::InvalidCurrencyCode(code));
        }
        Ok(Self(code))
    }

    /// US dollar, the fixed base of the upstream feed.
    pub fn usd() -> Self {
        Self::new("USD")
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for CurrencyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
