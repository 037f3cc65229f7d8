//! Error handling and errno mapping for the FUSE filesystem.

use std::ffi::OsString;
use thiserror::Error;
use webhdfs_core::{ClientError, HdfsPath};
use webhdfs_mount::ErrorCategory;

/// Errors returned by filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path does not exist (possibly answered from the negative cache).
    #[error("No such file or directory: {0}")]
    NotFound(HdfsPath),

    /// The operation cannot be expressed against an append-only backend.
    #[error("Operation not supported on {path}: {detail}")]
    NotSupported {
        /// Target of the rejected operation.
        path: HdfsPath,
        /// Why it was rejected.
        detail: String,
    },

    /// The backend refused a rename.
    #[error("Rename of {from} to {to} refused by backend")]
    NoSpace {
        /// Source path.
        from: HdfsPath,
        /// Destination path.
        to: HdfsPath,
    },

    /// Remote storage failure.
    #[error("Remote storage error: {0}")]
    Client(#[from] ClientError),

    /// Unknown or forgotten inode.
    #[error("Invalid inode: {0}")]
    InvalidInode(u64),

    /// File name is not valid UTF-8 or contains a separator.
    #[error("Invalid file name: {0:?}")]
    InvalidName(OsString),

    /// Rename between two different directories.
    #[error("Cross-directory rename is not supported")]
    CrossDirectoryRename,

    /// `renameat2` flags other than `RENAME_NOREPLACE`.
    #[error("Unsupported rename flags: {0:#x}")]
    UnsupportedRenameFlags(u32),
}

impl FsError {
    /// Converts this error to a libc error code for FUSE.
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::NotSupported { .. } => libc::ENOTSUP,
            FsError::NoSpace { .. } => libc::ENOSPC,
            FsError::Client(e) => ErrorCategory::from(e).to_errno(),
            FsError::InvalidInode(_) => libc::ENOENT,
            FsError::InvalidName(_) => libc::EINVAL,
            FsError::CrossDirectoryRename => libc::EXDEV,
            FsError::UnsupportedRenameFlags(_) => libc::EINVAL,
        }
    }

    /// Returns true if this error means the path is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            FsError::NotFound(_) => true,
            FsError::Client(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
