//! WebHDFS status records and response envelopes.
//!
//! These mirror the JSON bodies returned by the WebHDFS REST API
//! (`GETFILESTATUS`, `LISTSTATUS`, boolean results and `RemoteException`).
//! A status record is an immutable snapshot of one path as observed when
//! the request was served.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Kind of an HDFS namespace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// A symbolic link (reported by HDFS but not followed by the mount).
    Symlink,
}

/// POSIX-style permission bits, carried by WebHDFS as an octal string.
///
/// ```
/// use webhdfs_core::Permission;
///
/// let perm: Permission = "755".parse().unwrap();
/// assert_eq!(perm.bits(), 0o755);
/// assert_eq!(perm.to_string(), "755");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Permission(u16);

impl Permission {
    /// Builds a permission from a mode word, keeping only the `0o7777` bits.
    pub fn from_mode(mode: u32) -> Self {
        // Masked to 12 bits, so the narrowing cannot lose information.
        #[allow(clippy::cast_possible_truncation)]
        Permission((mode & 0o7777) as u16)
    }

    /// The raw permission bits.
    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }
}

/// Error returned when a permission string is not valid octal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid octal permission: {0:?}")]
pub struct InvalidPermission(pub String);

impl FromStr for Permission {
    type Err = InvalidPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u16::from_str_radix(s, 8)
            .ok()
            .filter(|bits| *bits <= 0o7777)
            .map(Permission)
            .ok_or_else(|| InvalidPermission(s.to_string()))
    }
}

impl TryFrom<String> for Permission {
    type Error = InvalidPermission;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

/// One `FileStatus` object as returned by `GETFILESTATUS` / `LISTSTATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Permission bits.
    pub permission: Permission,
    /// Last modification time, epoch milliseconds.
    pub modification_time: u64,
    /// Last access time, epoch milliseconds.
    #[serde(default)]
    pub access_time: u64,
    /// HDFS block size in bytes (0 for directories).
    #[serde(default)]
    pub block_size: u64,
    /// Logical length in bytes.
    #[serde(default)]
    pub length: u64,
    /// Number of children (directories only; absent on older namenodes).
    #[serde(default)]
    pub children_num: u64,
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Last path component; empty when the status describes the requested path itself.
    #[serde(default)]
    pub path_suffix: String,
}

impl FileStatus {
    /// Returns true for directory entries.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// `{"FileStatus": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct FileStatusEnvelope {
    #[serde(rename = "FileStatus")]
    pub file_status: FileStatus,
}

/// `{"FileStatuses": {"FileStatus": [...]}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ListStatusEnvelope {
    #[serde(rename = "FileStatuses")]
    pub file_statuses: FileStatusList,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileStatusList {
    #[serde(rename = "FileStatus", default)]
    pub file_status: Vec<FileStatus>,
}

/// `{"boolean": true}`
#[derive(Debug, Deserialize)]
pub(crate) struct BooleanEnvelope {
    pub boolean: bool,
}

/// `{"RemoteException": {"exception": ..., "javaClassName": ..., "message": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteExceptionEnvelope {
    #[serde(rename = "RemoteException")]
    pub remote_exception: RemoteException,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteException {
    pub exception: String,
    #[serde(default)]
    pub message: String,
}
