//! Main FX engine implementation.

use std::sync::Arc;

use exrates_common::{Clock, CurrencyCode, RateSnapshot};
use tracing::{debug, instrument};

use crate::cache::{RateCache, RateCacheConfig};
use crate::conversion::Conversion;
use crate::error::{FxError, FxResult};
use crate::metrics::CacheStats;
use crate::provider::RateProvider;

/// Configuration for the FX engine.
#[derive(Debug, Clone, Default)]
pub struct FxEngineConfig {
    /// Cache configuration.
    pub cache: RateCacheConfig,
}

/// Rate lookups and conversions over the cached snapshot.
pub struct FxEngine {
    cache: RateCache,
}

impl FxEngine {
    /// Create a new FX engine with the given provider.
    pub fn new(provider: Arc<dyn RateProvider>, config: FxEngineConfig) -> Self {
        Self {
            cache: RateCache::with_config(provider, config.cache),
        }
    }

    /// Replace the clock driving cache expiry.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: self.cache.with_clock(clock),
        }
    }

    /// Get the current rate snapshot.
    #[instrument(skip(self))]
    pub async fn get_rates(&self) -> FxResult<Arc<RateSnapshot>> {
        self.cache.get_rates().await
    }

    /// Get the rate of a single currency against the snapshot base.
    pub async fn rate(&self, code: &CurrencyCode) -> FxResult<f64> {
        let snapshot = self.get_rates().await?;
        snapshot
            .rate(code.as_str())
            .ok_or_else(|| FxError::UnknownCurrency {
                codes: vec![code.clone()],
            })
    }

    /// Convert an amount between two currencies of the current snapshot.
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    pub async fn convert(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<Conversion> {
        let snapshot = self.get_rates().await?;
        let conversion = Conversion::compute(&snapshot, amount, from, to)?;

        debug!(
            rate = conversion.rate,
            converted_amount = conversion.converted_amount,
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Currency codes of the current snapshot, in upstream order.
    #[instrument(skip(self))]
    pub async fn supported_currencies(&self) -> FxResult<Vec<CurrencyCode>> {
        let snapshot = self.get_rates().await?;
        Ok(snapshot.codes().to_vec())
    }

    /// Underlying cache.
    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Get engine statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
