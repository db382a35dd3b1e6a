//! exrates FX Engine
//!
//! Cached exchange rates and currency conversion backed by a single
//! upstream provider.
//!
//! # Features
//!
//! - One shared rate snapshot with a fixed TTL (one day by default)
//! - Single-flight refresh: concurrent stale reads trigger one upstream call
//! - Retry-free upstream fetches; failures leave the cache untouched
//! - Cross-rate conversion and currency listing over the active snapshot
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use exrates_fx::{ExchangeRateApiProvider, FxEngine, FxEngineConfig};
//! use exrates_common::CurrencyCode;
//!
//! let provider = Arc::new(ExchangeRateApiProvider::new(api_key)?);
//! let engine = FxEngine::new(provider, FxEngineConfig::default());
//!
//! let conversion = engine
//!     .convert(100.0, &CurrencyCode::usd(), &CurrencyCode::new("EUR"))
//!     .await?;
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod conversion;
pub mod metrics;
pub mod error;

pub use engine::{FxEngine, FxEngineConfig};
pub use provider::{ExchangeRateApiProvider, RateProvider};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
pub use cache::{CachedSnapshot, RateCache, RateCacheConfig};
pub use conversion::Conversion;
pub use metrics::CacheStats;
pub use error::{FxError, FxResult, ProviderError};
