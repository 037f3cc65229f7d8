//! Error category mapping for WebHDFS client errors.
//!
//! The FUSE layer needs a POSIX errno for every failure. [`ErrorCategory`]
//! classifies a [`ClientError`] (including the Java exception name carried
//! in a `RemoteException` body) into a small set of semantic categories,
//! each of which has one errno.

use std::io;
use webhdfs_core::ClientError;

/// Semantic category for remote storage errors.
///
/// ```
/// use webhdfs_core::ClientError;
/// use webhdfs_mount::ErrorCategory;
///
/// let err = ClientError::NotFound { path: "/tmp/x".to_string() };
/// assert_eq!(ErrorCategory::from(&err), ErrorCategory::NotFound);
/// assert_eq!(ErrorCategory::from(&err).to_errno(), libc::ENOENT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Path does not exist (ENOENT)
    NotFound,
    /// Path already exists (EEXIST)
    AlreadyExists,
    /// Directory not empty (ENOTEMPTY)
    NotEmpty,
    /// Expected a directory (ENOTDIR)
    NotDirectory,
    /// Access refused by the backend or gateway (EACCES)
    PermissionDenied,
    /// Namenode in safe mode (EROFS)
    ReadOnly,
    /// Request timed out (ETIMEDOUT)
    TimedOut,
    /// Quota exhausted (ENOSPC)
    NoSpace,
    /// Invalid argument (EINVAL)
    InvalidArgument,
    /// Operation not supported (ENOTSUP)
    NotSupported,
    /// Any other failure (EIO)
    IoError,
}

impl ErrorCategory {
    /// POSIX errno for this category.
    #[inline]
    pub fn to_errno(self) -> i32 {
        match self {
            Self::NotFound => libc::ENOENT,
            Self::AlreadyExists => libc::EEXIST,
            Self::NotEmpty => libc::ENOTEMPTY,
            Self::NotDirectory => libc::ENOTDIR,
            Self::PermissionDenied => libc::EACCES,
            Self::ReadOnly => libc::EROFS,
            Self::TimedOut => libc::ETIMEDOUT,
            Self::NoSpace => libc::ENOSPC,
            Self::InvalidArgument => libc::EINVAL,
            Self::NotSupported => libc::ENOTSUP,
            Self::IoError => libc::EIO,
        }
    }

    /// Category for a Java exception name from a `RemoteException` body.
    pub fn from_exception(exception: &str) -> Self {
        match exception {
            "FileNotFoundException" => Self::NotFound,
            "FileAlreadyExistsException" => Self::AlreadyExists,
            "PathIsNotEmptyDirectoryException" => Self::NotEmpty,
            "ParentNotDirectoryException" => Self::NotDirectory,
            "AccessControlException" | "SecurityException" => Self::PermissionDenied,
            "SafeModeException" => Self::ReadOnly,
            "DSQuotaExceededException" | "NSQuotaExceededException" => Self::NoSpace,
            "IllegalArgumentException" | "InvalidPathException" => Self::InvalidArgument,
            "UnsupportedOperationException" => Self::NotSupported,
            _ => Self::IoError,
        }
    }
}

impl From<&ClientError> for ErrorCategory {
    fn from(e: &ClientError) -> Self {
        match e {
            ClientError::NotFound { .. } => Self::NotFound,
            ClientError::NotADirectory { .. } => Self::NotDirectory,
            ClientError::PermissionDenied { .. } | ClientError::Unauthorized => {
                Self::PermissionDenied
            }
            ClientError::Remote { exception, .. } => Self::from_exception(exception),
            ClientError::Http(_) if e.is_timeout() => Self::TimedOut,
            ClientError::Certificate { source, .. } => io_error_category(source),
            ClientError::Rejected { .. }
            | ClientError::MissingRedirect { .. }
            | ClientError::Http(_)
            | ClientError::Decode { .. }
            | ClientError::InvalidUrl { .. } => Self::IoError,
        }
    }
}

fn io_error_category(e: &io::Error) -> ErrorCategory {
    match e.kind() {
        io::ErrorKind::NotFound => ErrorCategory::NotFound,
        io::ErrorKind::PermissionDenied => ErrorCategory::PermissionDenied,
        io::ErrorKind::AlreadyExists => ErrorCategory::AlreadyExists,
        io::ErrorKind::TimedOut => ErrorCategory::TimedOut,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => ErrorCategory::InvalidArgument,
        io::ErrorKind::Unsupported => ErrorCategory::NotSupported,
        _ => ErrorCategory::IoError,
    }
}
