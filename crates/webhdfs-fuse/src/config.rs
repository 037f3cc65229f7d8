//! Mount configuration for the FUSE filesystem.

use std::time::Duration;
use webhdfs_mount::{CacheTtls, DEFAULT_TTL};

/// How long the kernel may cache entries and attributes we return (1 second).
///
/// Kept short so the in-process caches, which are invalidated on mutation,
/// stay the source of truth.
pub const DEFAULT_KERNEL_TTL: Duration = Duration::from_secs(1);

/// Largest write request the kernel is asked to send (1 MiB).
pub const MAX_WRITE: u32 = 1024 * 1024;

/// Configuration options for the FUSE filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    /// Time-to-live for cached attributes. Default: 30 seconds.
    pub attr_ttl: Duration,

    /// Time-to-live for cached directory listings. Default: 30 seconds.
    pub listing_ttl: Duration,

    /// Time-to-live for not-found entries. Default: 30 seconds.
    pub negative_ttl: Duration,

    /// Entry/attribute TTL handed to the kernel in replies. Default: 1 second.
    pub kernel_ttl: Duration,

    /// Mount read-only.
    pub read_only: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            attr_ttl: DEFAULT_TTL,
            listing_ttl: DEFAULT_TTL,
            negative_ttl: DEFAULT_TTL,
            kernel_ttl: DEFAULT_KERNEL_TTL,
            read_only: false,
        }
    }
}

impl MountConfig {
    /// Creates a configuration with one TTL for all three caches.
    pub fn with_cache_ttl(ttl: Duration) -> Self {
        Self::default().cache_ttl(ttl)
    }

    /// Sets the TTL of all three caches.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.attr_ttl = ttl;
        self.listing_ttl = ttl;
        self.negative_ttl = ttl;
        self
    }

    /// Sets the cache TTL for attributes.
    #[must_use]
    pub fn attr_ttl(mut self, ttl: Duration) -> Self {
        self.attr_ttl = ttl;
        self
    }

    /// Sets the cache TTL for directory listings.
    #[must_use]
    pub fn listing_ttl(mut self, ttl: Duration) -> Self {
        self.listing_ttl = ttl;
        self
    }

    /// Sets the cache TTL for negative entries.
    #[must_use]
    pub fn negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    /// Sets the TTL reported to the kernel.
    #[must_use]
    pub fn kernel_ttl(mut self, ttl: Duration) -> Self {
        self.kernel_ttl = ttl;
        self
    }

    /// Mount read-only.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Cache lifetimes for the metadata store.
    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls {
            attributes: self.attr_ttl,
            listings: self.listing_ttl,
            negative: self.negative_ttl,
        }
    }
}
