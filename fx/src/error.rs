//! FX engine error types.

use std::sync::Arc;

use exrates_common::{CommonError, CurrencyCode};
use thiserror::Error;

/// Failures of a single upstream fetch.
///
/// Cloneable so one failed refresh can be reported to every caller that
/// queued behind it.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network-level failure: timeout, connection refused, DNS.
    #[error("Transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// Provider answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    /// Provider answered 2xx but reported an error in the body.
    #[error("Upstream rejected request: {0}")]
    Rejected(String),

    /// Body could not be parsed into a rate table.
    #[error("Malformed upstream response: {0}")]
    Parse(String),

    /// No API key configured.
    #[error("Missing upstream API key")]
    MissingApiKey,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(Arc::new(err))
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

impl From<CommonError> for ProviderError {
    fn from(err: CommonError) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// Rates could not be obtained from the upstream provider.
    #[error("Failed to fetch exchange rates: {0}")]
    Upstream(#[from] ProviderError),

    /// One or more currency codes are not in the active snapshot.
    #[error("Unknown currency code: {}", join_codes(.codes))]
    UnknownCurrency { codes: Vec<CurrencyCode> },
}

impl FxError {
    /// Whether the error came from the upstream provider.
    pub fn is_upstream(&self) -> bool {
        matches!(self, FxError::Upstream(_))
    }
}

fn join_codes(codes: &[CurrencyCode]) -> String {
    codes
        .iter()
        .map(CurrencyCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
