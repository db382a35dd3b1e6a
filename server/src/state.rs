//! Shared application state.

use std::sync::Arc;

use anyhow::Context;
use exrates_fx::{ExchangeRateApiProvider, FxEngine, RateProvider};
use tracing::info;

use crate::config::ServerConfig;

/// State handed to every request handler.
pub struct AppState {
    /// Rate cache and conversion engine.
    pub engine: Arc<FxEngine>,
}

impl AppState {
    /// Wrap an already built engine.
    pub fn new(engine: FxEngine) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::new(engine),
        })
    }
}

/// Build state backed by the exchangerate-api.com provider.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let api_key = config
        .api_key
        .clone()
        .context("Upstream API key is not configured")?;

    let provider = ExchangeRateApiProvider::new(api_key)?;
    info!(
        provider = provider.name(),
        base = %provider.base(),
        ttl_secs = config.fx.cache.ttl.num_seconds(),
        "Rate provider configured"
    );

    let engine = FxEngine::new(Arc::new(provider), config.fx.clone());
    Ok(AppState::new(engine))
}
