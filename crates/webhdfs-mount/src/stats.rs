//! Cache statistics for the metadata caches.
//!
//! Counters are lock-free atomics so they can be bumped from any cache
//! operation without contention. A [`StoreStats`] groups one [`CacheStats`]
//! per cache kind and is logged when the filesystem is unmounted.
//!
//! ```
//! use webhdfs_mount::stats::CacheStats;
//!
//! let stats = CacheStats::new();
//! stats.record_hit();
//! stats.record_hit();
//! stats.record_miss();
//! assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry.
    pub hits: AtomicU64,
    /// Lookups that found nothing fresh.
    pub misses: AtomicU64,
    /// Entries stored.
    pub inserts: AtomicU64,
    /// Entries dropped by explicit invalidation.
    pub invalidations: AtomicU64,
    /// Entries dropped because their TTL elapsed or capacity was exceeded.
    pub evictions: AtomicU64,
}

impl CacheStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an entry being stored.
    #[inline]
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an explicit invalidation.
    #[inline]
    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an expiry or capacity eviction.
    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Total hits.
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total misses.
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate as a fraction (0.0 to 1.0); 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Lookups answered from a fresh entry.
    pub hits: u64,
    /// Lookups that found nothing fresh.
    pub misses: u64,
    /// Entries stored.
    pub inserts: u64,
    /// Explicit invalidations.
    pub invalidations: u64,
    /// Expiry or capacity evictions.
    pub evictions: u64,
}

impl CacheStatsSnapshot {
    /// Hit rate as a fraction (0.0 to 1.0); 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits / {} misses ({:.1}%), {} inserts, {} invalidated, {} evicted",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.inserts,
            self.invalidations,
            self.evictions
        )
    }
}

/// Statistics for all three metadata caches.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Attribute cache.
    pub attributes: CacheStats,
    /// Directory listing cache.
    pub listings: CacheStats,
    /// Not-found cache. A hit here is a lookup answered without a remote call.
    pub negative: CacheStats,
}

impl StoreStats {
    /// Create zeroed counters for every cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a one-line summary per cache at `info` level.
    pub fn log_summary(&self) {
        tracing::info!(stats = %self.attributes.snapshot(), "Attribute cache");
        tracing::info!(stats = %self.listings.snapshot(), "Listing cache");
        tracing::info!(stats = %self.negative.snapshot(), "Negative cache");
    }
}
