//! Single-snapshot rate cache with TTL and single-flight refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use exrates_common::{constants, is_older_than, Clock, RateSnapshot, SystemClock, Timestamp};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{FxResult, ProviderError};
use crate::metrics::{CacheMetrics, CacheStats};
use crate::provider::RateProvider;

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Maximum snapshot age before a refresh is required.
    pub ttl: Duration,
    /// Answer with the retained snapshot when a refresh fails.
    pub serve_stale_on_error: bool,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::rate_cache_ttl(),
            serve_stale_on_error: false,
        }
    }
}

/// A snapshot together with the time it was fetched.
///
/// The pair is always replaced as a unit.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub snapshot: Arc<RateSnapshot>,
    pub fetched_at: Timestamp,
}

impl CachedSnapshot {
    /// Age of the snapshot at `now`.
    pub fn age(&self, now: Timestamp) -> Duration {
        now.signed_duration_since(self.fetched_at)
    }

    /// Whether the snapshot is older than `ttl` at `now`.
    pub fn is_stale(&self, ttl: Duration, now: Timestamp) -> bool {
        is_older_than(self.fetched_at, ttl, now)
    }
}

/// Outcome of the most recent completed refresh attempt.
#[derive(Debug, Default)]
struct RefreshState {
    last_error: Option<ProviderError>,
}

/// Cache of the latest upstream snapshot.
///
/// Fresh reads take only a short read lock. Refreshes are serialised by an
/// async mutex held across the fetch. A waiter that acquires it after another
/// caller's attempt completed reuses that outcome: the refreshed snapshot, or
/// the same error. Concurrent stale reads therefore collapse into one
/// upstream call whether it succeeds or fails.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<CachedSnapshot>>,
    refresh: Mutex<RefreshState>,
    // Completed refresh attempts. Only written with `refresh` held.
    attempts: AtomicU64,
    metrics: CacheMetrics,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_config(provider, RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self {
            provider,
            clock: Arc::new(SystemClock),
            current: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
            metrics: CacheMetrics::new(),
            config,
        }
    }

    /// Replace the clock used for timestamps and staleness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a snapshot no older than the TTL, fetching one if needed.
    pub async fn get_rates(&self) -> FxResult<Arc<RateSnapshot>> {
        if let Some(snapshot) = self.fresh() {
            self.metrics.hit();
            debug!("Cache hit");
            return Ok(snapshot);
        }

        self.metrics.miss();
        let seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh() {
            debug!("Cache refreshed by concurrent caller");
            return Ok(snapshot);
        }

        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(e) = state.last_error.clone() {
                debug!(error = %e, "Concurrent refresh failed, sharing its error");
                return self.refresh_failed(e);
            }
        }

        self.refresh_locked(&mut state).await
    }

    /// Current cached state, without fetching.
    pub fn peek(&self) -> Option<CachedSnapshot> {
        self.current.read().clone()
    }

    /// Whether the next read would trigger a fetch.
    pub fn is_stale(&self) -> bool {
        self.fresh().is_none()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    fn fresh(&self) -> Option<Arc<RateSnapshot>> {
        let now = self.clock.now();
        self.current
            .read()
            .as_ref()
            .filter(|cached| !cached.is_stale(self.config.ttl, now))
            .map(|cached| cached.snapshot.clone())
    }

    // Dropping the returned future mid-fetch releases the guard without
    // touching the snapshot or the attempt counter.
    async fn refresh_locked(&self, state: &mut RefreshState) -> FxResult<Arc<RateSnapshot>> {
        self.metrics.fetch_started();
        let outcome = self.provider.fetch().await;

        state.last_error = outcome.as_ref().err().cloned();
        self.attempts.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let fetched_at = self.clock.now();

                *self.current.write() = Some(CachedSnapshot {
                    snapshot: snapshot.clone(),
                    fetched_at,
                });

                info!(
                    provider = self.provider.name(),
                    base = %snapshot.base(),
                    currencies = snapshot.len(),
                    fetched_at = %fetched_at,
                    "Refreshed exchange rates"
                );
                Ok(snapshot)
            }
            Err(e) => {
                self.metrics.fetch_failed();
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "Failed to refresh exchange rates"
                );
                self.refresh_failed(e)
            }
        }
    }

    fn refresh_failed(&self, e: ProviderError) -> FxResult<Arc<RateSnapshot>> {
        if self.config.serve_stale_on_error {
            if let Some(stale) = self.peek() {
                self.metrics.served_stale();
                warn!(
                    fetched_at = %stale.fetched_at,
                    age_secs = stale.age(self.clock.now()).num_seconds(),
                    "Serving stale exchange rates"
                );
                return Ok(stale.snapshot);
            }
        }

        Err(e.into())
    }
}
