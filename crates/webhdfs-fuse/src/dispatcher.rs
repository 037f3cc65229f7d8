//! Path-addressed filesystem operations over a cached remote namespace.
//!
//! The [`Dispatcher`] answers each POSIX operation from the metadata caches
//! when it can and otherwise issues exactly one [`RemoteStorage`] call,
//! updating the caches with what it learns. Every successful mutation
//! invalidates the affected path (and with it the parent's listing) so the
//! next lookup observes the backend's state.
//!
//! Writes follow the backend's append-only model: a write is accepted only
//! if it ends at or beyond the current end of file and does not start past
//! it. Bytes that overlap existing content are assumed to match and are
//! skipped; the rest is appended.

use crate::error::{FsError, FsResult};
use bytes::Bytes;
use tracing::{debug, info, warn};
use webhdfs_core::{HdfsPath, Permission, RemoteStorage};
use webhdfs_mount::{
    AccountLookup, CacheStore, IdentityResolver, Listing, ListingEntry, PosixAttr,
    SystemAccounts, translate,
};

/// Result of an operation the backend may not be able to honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The change was made.
    Applied,
    /// The request was accepted but had no effect.
    Ignored,
}

/// Cached dispatch of filesystem operations to a [`RemoteStorage`].
pub struct Dispatcher<R, A = SystemAccounts> {
    remote: R,
    cache: CacheStore,
    ids: IdentityResolver<A>,
}

impl<R: RemoteStorage> Dispatcher<R, SystemAccounts> {
    /// Dispatcher resolving owners through the host's account database.
    pub fn new(remote: R, cache: CacheStore) -> Self {
        Self::with_identities(remote, cache, IdentityResolver::system())
    }
}

impl<R: RemoteStorage, A: AccountLookup> Dispatcher<R, A> {
    /// Dispatcher with an explicit identity resolver.
    pub fn with_identities(remote: R, cache: CacheStore, ids: IdentityResolver<A>) -> Self {
        Self { remote, cache, ids }
    }

    /// The metadata caches.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Attributes of `path`, from cache when fresh.
    pub fn get_attributes(&self, path: &HdfsPath) -> FsResult<PosixAttr> {
        if self.cache.is_negatively_cached(path) {
            debug!(path = %path, "Negative cache hit");
            return Err(FsError::NotFound(path.clone()));
        }
        if let Some(attr) = self.cache.get_attributes(path) {
            debug!(path = %path, "Attribute cache hit");
            return Ok(attr);
        }
        debug!(path = %path, "Attribute cache miss");
        self.refresh_attributes(path)
    }

    /// Fetch the status of `path` from the backend, bypassing the cache, and cache the result.
    fn refresh_attributes(&self, path: &HdfsPath) -> FsResult<PosixAttr> {
        match self.remote.fetch_status(path) {
            Ok(status) => {
                let attr = translate(&status, &self.ids);
                self.cache.put_attributes(path, attr);
                Ok(attr)
            }
            Err(e) if e.is_not_found() => {
                self.cache.mark_negative(path);
                Err(FsError::NotFound(path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Children of directory `path`, in backend order.
    ///
    /// A listing fetched from the backend also seeds the attribute cache
    /// for every child. `.` and `..` are not included.
    pub fn list_directory(&self, path: &HdfsPath) -> FsResult<Listing> {
        if let Some(entries) = self.cache.get_listing(path) {
            debug!(path = %path, entries = entries.len(), "Listing cache hit");
            return Ok(entries);
        }

        let statuses = self.remote.fetch_listing(path)?;
        debug!(path = %path, entries = statuses.len(), "Listing cache miss");

        let mut entries = Vec::with_capacity(statuses.len());
        for status in statuses {
            let child = path.join(&status.path_suffix);
            self.cache.put_attributes(&child, translate(&status, &self.ids));
            let is_dir = status.is_dir();
            entries.push(ListingEntry::new(status.path_suffix, is_dir));
        }
        Ok(self.cache.put_listing(path, entries))
    }

    /// Up to `length` bytes of `path` starting at `offset`.
    pub fn read(&self, path: &HdfsPath, length: u32, offset: u64) -> FsResult<Bytes> {
        let size = self.get_attributes(path)?.size;
        if offset >= size || length == 0 {
            return Ok(Bytes::new());
        }
        let mut data = self.remote.read_range(path, offset, u64::from(length))?;
        data.truncate(length as usize);
        Ok(data)
    }

    /// Create (or truncate) `path` as an empty file.
    pub fn create(&self, path: &HdfsPath, mode: u32) -> FsResult<()> {
        let permission = Permission::from_mode(mode & 0o777);
        info!(path = %path, permission = %permission, "Creating file");
        self.remote.create_empty(path, permission)?;
        self.cache.invalidate(path);
        Ok(())
    }

    /// Write `data` at `offset`, returning the number of bytes accepted.
    pub fn write(&self, path: &HdfsPath, data: &[u8], offset: u64) -> FsResult<usize> {
        let size = self.refresh_attributes(path)?.size;
        let skip = appendable_suffix(size, offset, data.len()).ok_or_else(|| {
            warn!(
                path = %path,
                offset,
                len = data.len(),
                size,
                "Rejecting non-append write"
            );
            FsError::NotSupported {
                path: path.clone(),
                detail: format!(
                    "write of {} bytes at offset {offset} does not extend a file of {size} bytes",
                    data.len()
                ),
            }
        })?;

        let suffix = &data[skip..];
        if !suffix.is_empty() {
            debug!(path = %path, bytes = suffix.len(), "Appending");
            self.remote.append_bytes(path, suffix)?;
            self.cache.invalidate(path);
        }
        Ok(data.len())
    }

    /// Create directory `path`.
    pub fn mkdir(&self, path: &HdfsPath, mode: u32) -> FsResult<()> {
        let permission = Permission::from_mode(mode & 0o777);
        info!(path = %path, permission = %permission, "Creating directory");
        self.remote.make_directory(path, permission)?;
        self.cache.invalidate(path);
        Ok(())
    }

    /// Remove file `path`.
    pub fn unlink(&self, path: &HdfsPath) -> FsResult<()> {
        info!(path = %path, "Deleting file");
        self.delete(path)
    }

    /// Remove directory `path` and everything below it.
    pub fn rmdir(&self, path: &HdfsPath) -> FsResult<()> {
        info!(path = %path, "Deleting directory");
        self.delete(path)?;
        self.cache.forget_listing(path);
        Ok(())
    }

    fn delete(&self, path: &HdfsPath) -> FsResult<()> {
        let deleted = self.remote.delete(path)?;
        self.cache.invalidate(path);
        if deleted {
            Ok(())
        } else {
            Err(FsError::NotFound(path.clone()))
        }
    }

    /// Rename `old_path` to `new_name` within the same directory.
    ///
    /// Returns the new path. A rename the backend refuses fails with
    /// [`FsError::NoSpace`].
    pub fn rename(&self, old_path: &HdfsPath, new_name: &str) -> FsResult<HdfsPath> {
        let new_path = old_path.dirname().join(new_name);
        info!(from = %old_path, to = %new_path, "Renaming");

        if !self.remote.rename_path(old_path, &new_path)? {
            warn!(from = %old_path, to = %new_path, "Rename refused by backend");
            return Err(FsError::NoSpace {
                from: old_path.clone(),
                to: new_path,
            });
        }
        self.cache.invalidate(old_path);
        self.cache.invalidate(&new_path);
        self.cache.forget_listing(old_path);
        self.cache.forget_listing(&new_path);
        Ok(new_path)
    }

    /// Permission changes are not propagated to the backend.
    pub fn chmod(&self, path: &HdfsPath, mode: u32) -> Outcome {
        warn!(path = %path, mode = format_args!("{mode:o}"), "Ignoring chmod");
        Outcome::Ignored
    }

    /// Ownership changes are not propagated to the backend.
    pub fn chown(&self, path: &HdfsPath, uid: Option<u32>, gid: Option<u32>) -> Outcome {
        warn!(path = %path, ?uid, ?gid, "Ignoring chown");
        Outcome::Ignored
    }

    /// Change the length of `path`.
    ///
    /// Only truncation to zero (re-created empty, keeping all of its
    /// permission bits including setuid, setgid and sticky) and no-op
    /// resizes can be expressed on the backend.
    pub fn truncate(&self, path: &HdfsPath, size: u64) -> FsResult<Outcome> {
        let attr = self.refresh_attributes(path)?;
        if size == attr.size {
            return Ok(Outcome::Ignored);
        }
        if size != 0 {
            warn!(path = %path, from = attr.size, to = size, "Rejecting truncate");
            return Err(FsError::NotSupported {
                path: path.clone(),
                detail: format!("cannot resize from {} to {size} bytes", attr.size),
            });
        }
        let permission = Permission::from_mode(attr.permissions());
        info!(path = %path, permission = %permission, "Truncating to zero");
        self.remote.create_empty(path, permission)?;
        self.cache.invalidate(path);
        Ok(Outcome::Applied)
    }
}

/// Number of leading bytes of a write that already exist in the file.
///
/// A write of `len` bytes at `offset` into a file of `size` bytes is
/// appendable when `offset <= size <= offset + len`; the first
/// `size - offset` bytes overlap the file and the rest are new. Returns
/// `None` when the write would modify existing bytes without reaching
/// the end, or leave a hole.
pub fn appendable_suffix(size: u64, offset: u64, len: usize) -> Option<usize> {
    let end = offset.checked_add(len as u64)?;
    if offset > size || end < size {
        return None;
    }
    usize::try_from(size - offset).ok()
}
