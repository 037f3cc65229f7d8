//! Metadata layer for the WebHDFS FUSE mount.
//!
//! Everything between a remote [`FileStatus`](webhdfs_core::FileStatus) and
//! the attributes handed to the kernel lives here:
//!
//! - [`CacheStore`] - attribute, listing and not-found caches with TTL expiry
//! - [`IdentityResolver`] - owner/group names to local uid/gid, memoized
//! - [`translate`] - status record to [`PosixAttr`]
//! - [`ErrorCategory`] - client error to errno classification
//! - [`stats`] - hit/miss counters for the caches

#![warn(missing_docs)]

pub mod attr;
pub mod cache;
mod error_category;
pub mod identity;
pub mod stats;

pub use attr::{PosixAttr, translate};
pub use cache::{CacheStore, CacheTtls, DEFAULT_TTL, Listing, ListingEntry};
pub use error_category::ErrorCategory;
pub use identity::{AccountLookup, IdentityResolver, SystemAccounts};
pub use stats::{CacheStats, StoreStats};
