//! Counters for rate cache monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

/// Rate cache metrics.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Requests answered from a fresh snapshot.
    pub hits: AtomicU64,
    /// Requests that found the cache empty or stale.
    pub misses: AtomicU64,
    /// Upstream fetches started.
    pub upstream_fetches: AtomicU64,
    /// Upstream fetches that failed.
    pub fetch_failures: AtomicU64,
    /// Failed refreshes answered with the retained stale snapshot.
    pub stale_served: AtomicU64,
}

impl CacheMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh-cache hit.
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an empty or stale cache.
    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upstream fetch.
    pub fn fetch_started(&self) {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upstream failure.
    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stale snapshot served after a failed refresh.
    pub fn served_stale(&self) {
        self.stale_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub upstream_fetches: u64,
    pub fetch_failures: u64,
    pub stale_served: u64,
}
