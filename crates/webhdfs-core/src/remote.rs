//! The contract the filesystem layer needs from a storage backend.

use crate::error::ClientResult;
use crate::path::HdfsPath;
use crate::status::{FileStatus, Permission};
use bytes::Bytes;

/// Blocking request/response access to an HDFS-like namespace.
///
/// The backend is append-only: files are created empty (or overwritten)
/// and then only grown at their end. Every call is a single round-trip;
/// implementations do not retry.
pub trait RemoteStorage {
    /// Status of a single path. Fails with `NotFound` if absent.
    fn fetch_status(&self, path: &HdfsPath) -> ClientResult<FileStatus>;

    /// Statuses of all children of a directory, in backend order.
    ///
    /// Fails with `NotFound` or `NotADirectory`.
    fn fetch_listing(&self, path: &HdfsPath) -> ClientResult<Vec<FileStatus>>;

    /// Up to `length` bytes starting at `offset`.
    fn read_range(&self, path: &HdfsPath, offset: u64, length: u64) -> ClientResult<Bytes>;

    /// Create an empty file, overwriting any existing one.
    fn create_empty(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()>;

    /// Append bytes to the end of an existing file.
    fn append_bytes(&self, path: &HdfsPath, data: &[u8]) -> ClientResult<()>;

    /// Create a directory (and any missing parents).
    fn make_directory(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()>;

    /// Delete a path, recursively for directories. Returns the backend's success flag.
    fn delete(&self, path: &HdfsPath) -> ClientResult<bool>;

    /// Rename a path. Returns the backend's success flag.
    fn rename_path(&self, from: &HdfsPath, to: &HdfsPath) -> ClientResult<bool>;
}

impl<T: RemoteStorage + ?Sized> RemoteStorage for std::sync::Arc<T> {
    fn fetch_status(&self, path: &HdfsPath) -> ClientResult<FileStatus> {
        (**self).fetch_status(path)
    }

    fn fetch_listing(&self, path: &HdfsPath) -> ClientResult<Vec<FileStatus>> {
        (**self).fetch_listing(path)
    }

    fn read_range(&self, path: &HdfsPath, offset: u64, length: u64) -> ClientResult<Bytes> {
        (**self).read_range(path, offset, length)
    }

    fn create_empty(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()> {
        (**self).create_empty(path, permission)
    }

    fn append_bytes(&self, path: &HdfsPath, data: &[u8]) -> ClientResult<()> {
        (**self).append_bytes(path, data)
    }

    fn make_directory(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()> {
        (**self).make_directory(path, permission)
    }

    fn delete(&self, path: &HdfsPath) -> ClientResult<bool> {
        (**self).delete(path)
    }

    fn rename_path(&self, from: &HdfsPath, to: &HdfsPath) -> ClientResult<bool> {
        (**self).rename_path(from, to)
    }
}
