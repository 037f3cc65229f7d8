//! Translation of HDFS status records into POSIX attributes.

use crate::identity::{AccountLookup, IdentityResolver};
use webhdfs_core::FileStatus;

/// Smallest block size reported to the kernel (1 MiB).
///
/// HDFS reports 0 for directories and small values are possible for
/// files; reads are far more efficient in large chunks.
pub const MIN_BLOCK_SIZE: u64 = 1024 * 1024;

/// Directory type bit of the mode word.
pub const MODE_DIR: u32 = libc::S_IFDIR as u32;

/// Regular-file type bit of the mode word.
pub const MODE_FILE: u32 = libc::S_IFREG as u32;

const MODE_TYPE_MASK: u32 = libc::S_IFMT as u32;

/// POSIX attributes for one path.
///
/// Times are seconds since the epoch with millisecond precision, as
/// reported by the namenode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosixAttr {
    /// File type bits OR'd with permission bits.
    pub mode: u32,
    /// Link count; child count for directories, 1 otherwise.
    pub nlink: u32,
    /// Owner id.
    pub uid: u32,
    /// Group id.
    pub gid: u32,
    /// Length in bytes.
    pub size: u64,
    /// Whole blocks of `blksize` bytes.
    pub blocks: u64,
    /// Effective block size.
    pub blksize: u64,
    /// Last access.
    pub atime: f64,
    /// Last modification.
    pub mtime: f64,
    /// Last status change (HDFS does not track it separately).
    pub ctime: f64,
}

impl PosixAttr {
    /// Returns true if the mode word carries the directory type bit.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.mode & MODE_TYPE_MASK == MODE_DIR
    }

    /// Permission bits only.
    #[inline]
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Map one status record to POSIX attributes. Never fails.
pub fn translate<A: AccountLookup>(status: &FileStatus, ids: &IdentityResolver<A>) -> PosixAttr {
    let type_bits = if status.is_dir() { MODE_DIR } else { MODE_FILE };
    let blksize = status.block_size.max(MIN_BLOCK_SIZE);
    let nlink = if status.is_dir() {
        u32::try_from(status.children_num).unwrap_or(u32::MAX).max(1)
    } else {
        1
    };
    let mtime = millis_to_secs(status.modification_time);

    PosixAttr {
        mode: type_bits | u32::from(status.permission.bits()),
        nlink,
        uid: ids.owner_to_uid(&status.owner),
        gid: ids.group_to_gid(&status.group),
        size: status.length,
        blocks: status.length / blksize,
        blksize,
        atime: millis_to_secs(status.access_time),
        mtime,
        ctime: mtime,
    }
}

#[inline]
fn millis_to_secs(millis: u64) -> f64 {
    millis as f64 / 1000.0
}
