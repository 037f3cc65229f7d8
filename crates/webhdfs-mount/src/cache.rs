//! TTL-bounded metadata caches.
//!
//! The [`CacheStore`] keeps three independent caches keyed by absolute
//! mount path:
//!
//! - attributes: the translated [`PosixAttr`] of a path
//! - listings: the children of a directory, each with its directory flag
//! - negative: paths known not to exist
//!
//! Entries are fresh while younger than their cache's TTL; a stale entry is
//! indistinguishable from an absent one. At most one of the attribute and
//! negative caches holds a fresh entry for any path: storing into one
//! removes the path from the other.
//!
//! Each cache is a `moka::sync::Cache` with a fixed time-to-live, so expiry
//! is checked on every read and stale entries are reclaimed in the
//! background.

use crate::attr::PosixAttr;
use crate::stats::{CacheStats, StoreStats};
use moka::notification::RemovalCause;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use webhdfs_core::HdfsPath;

/// Default lifetime of every cache entry (30 seconds).
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Upper bound on entries per cache.
const MAX_CAPACITY: u64 = 100_000;

/// Lifetimes for each cache kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Attribute cache TTL.
    pub attributes: Duration,
    /// Listing cache TTL.
    pub listings: Duration,
    /// Negative cache TTL.
    pub negative: Duration,
}

impl CacheTtls {
    /// The same TTL for all three caches.
    pub const fn uniform(ttl: Duration) -> Self {
        Self {
            attributes: ttl,
            listings: ttl,
            negative: ttl,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::uniform(DEFAULT_TTL)
    }
}

/// One child of a cached directory listing.
///
/// The kind travels with the name so a listing stays usable after the
/// child's attributes have expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Child name, without any separator.
    pub name: String,
    /// True for subdirectories.
    pub is_dir: bool,
}

impl ListingEntry {
    /// Entry for a child called `name`.
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }
}

/// Children of one directory, shared between cache and callers.
pub type Listing = Arc<[ListingEntry]>;

/// The three metadata caches.
pub struct CacheStore {
    attributes: Cache<HdfsPath, PosixAttr>,
    listings: Cache<HdfsPath, Listing>,
    negative: Cache<HdfsPath, ()>,
    ttls: CacheTtls,
    stats: Arc<StoreStats>,
}

fn build<V>(
    ttl: Duration,
    stats: Arc<StoreStats>,
    pick: fn(&StoreStats) -> &CacheStats,
) -> Cache<HdfsPath, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(MAX_CAPACITY)
        .time_to_live(ttl)
        .eviction_listener(move |_path, _value, cause| {
            if cause == RemovalCause::Explicit {
                pick(&stats).record_invalidation();
            } else if cause.was_evicted() {
                pick(&stats).record_eviction();
            }
        })
        .build()
}

impl CacheStore {
    /// Empty caches with the given lifetimes.
    pub fn new(ttls: CacheTtls) -> Self {
        let stats = Arc::new(StoreStats::new());
        Self {
            attributes: build(ttls.attributes, Arc::clone(&stats), |s| &s.attributes),
            listings: build(ttls.listings, Arc::clone(&stats), |s| &s.listings),
            negative: build(ttls.negative, Arc::clone(&stats), |s| &s.negative),
            ttls,
            stats,
        }
    }

    /// Empty caches with [`DEFAULT_TTL`].
    pub fn with_defaults() -> Self {
        Self::new(CacheTtls::default())
    }

    /// Configured lifetimes.
    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    /// Hit, miss and eviction counters.
    pub fn stats(&self) -> &Arc<StoreStats> {
        &self.stats
    }

    /// Fresh attributes for `path`, if any.
    pub fn get_attributes(&self, path: &HdfsPath) -> Option<PosixAttr> {
        let hit = self.attributes.get(path);
        record_lookup(&self.stats.attributes, hit.is_some());
        hit
    }

    /// Store attributes for `path`, replacing any previous entry.
    pub fn put_attributes(&self, path: &HdfsPath, attr: PosixAttr) {
        self.negative.invalidate(path);
        self.attributes.insert(path.clone(), attr);
        self.stats.attributes.record_insert();
    }

    /// Fresh listing of directory `path`, if any.
    pub fn get_listing(&self, path: &HdfsPath) -> Option<Listing> {
        let hit = self.listings.get(path);
        record_lookup(&self.stats.listings, hit.is_some());
        hit
    }

    /// Store the children of directory `path`.
    pub fn put_listing(&self, path: &HdfsPath, entries: Vec<ListingEntry>) -> Listing {
        let listing: Listing = entries.into();
        self.listings.insert(path.clone(), Arc::clone(&listing));
        self.stats.listings.record_insert();
        listing
    }

    /// Returns true if `path` was recently found not to exist.
    pub fn is_negatively_cached(&self, path: &HdfsPath) -> bool {
        let hit = self.negative.contains_key(path);
        record_lookup(&self.stats.negative, hit);
        hit
    }

    /// Remember that `path` does not exist.
    pub fn mark_negative(&self, path: &HdfsPath) {
        self.attributes.invalidate(path);
        self.negative.insert(path.clone(), ());
        self.stats.negative.record_insert();
    }

    /// Forget everything known about `path` and its parent's listing.
    pub fn invalidate(&self, path: &HdfsPath) {
        tracing::debug!(path = %path, "Invalidating cached metadata");
        self.attributes.invalidate(path);
        self.negative.invalidate(path);
        self.listings.invalidate(&path.dirname());
    }

    /// Drop the cached listing of `path` itself.
    ///
    /// Used when a directory is removed or renamed away.
    pub fn forget_listing(&self, path: &HdfsPath) {
        self.listings.invalidate(path);
    }

    /// Drop every entry in every cache.
    pub fn clear(&self) {
        self.attributes.invalidate_all();
        self.listings.invalidate_all();
        self.negative.invalidate_all();
    }
}

#[inline]
fn record_lookup(stats: &CacheStats, hit: bool) {
    if hit {
        stats.record_hit();
    } else {
        stats.record_miss();
    }
}
