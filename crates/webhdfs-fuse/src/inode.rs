//! Inode management for the FUSE filesystem.
//!
//! fuser addresses files by inode number while HDFS addresses them by
//! path. The [`InodeTable`] keeps a bidirectional mapping between the two,
//! together with the kernel's lookup count for each inode.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use webhdfs_core::HdfsPath;

/// The root inode number (FUSE convention).
pub const ROOT_INODE: u64 = 1;

/// Inode reported for directory entries the kernel has not looked up yet.
pub const UNKNOWN_INODE: u64 = 0xffff_ffff;

#[derive(Debug)]
struct InodeEntry {
    path: HdfsPath,
    /// Kernel references; the entry is dropped when this reaches zero.
    nlookup: AtomicU64,
}

impl InodeEntry {
    fn new(path: HdfsPath) -> Self {
        Self {
            path,
            nlookup: AtomicU64::new(1),
        }
    }

    /// Decrements the lookup count; `None` if it would underflow.
    fn dec_nlookup(&self, count: u64) -> Option<u64> {
        self.nlookup
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(count))
            .ok()
            .map(|old| old - count)
    }
}

/// Thread-safe table mapping between inodes and paths.
pub struct InodeTable {
    path_to_inode: DashMap<HdfsPath, u64>,
    inode_to_entry: DashMap<u64, InodeEntry>,
    next_inode: AtomicU64,
}

impl InodeTable {
    /// Creates a table with the root directory pre-allocated.
    pub fn new() -> Self {
        let table = Self {
            path_to_inode: DashMap::new(),
            inode_to_entry: DashMap::new(),
            next_inode: AtomicU64::new(ROOT_INODE + 1),
        };
        table.path_to_inode.insert(HdfsPath::root(), ROOT_INODE);
        table
            .inode_to_entry
            .insert(ROOT_INODE, InodeEntry::new(HdfsPath::root()));
        table
    }

    /// Returns the inode for `path`, allocating one if needed, and counts one kernel lookup.
    pub fn get_or_insert(&self, path: HdfsPath) -> u64 {
        if let Some(inode) = self.path_to_inode.get(&path) {
            let ino = *inode;
            drop(inode);
            if let Some(entry) = self.inode_to_entry.get(&ino) {
                entry.nlookup.fetch_add(1, Ordering::SeqCst);
            }
            return ino;
        }

        let inode = self.path_to_inode.entry(path.clone()).or_insert_with(|| {
            let ino = self.next_inode.fetch_add(1, Ordering::SeqCst);
            self.inode_to_entry.insert(ino, InodeEntry::new(path));
            ino
        });
        *inode
    }

    /// Path currently mapped to `inode`.
    pub fn path_of(&self, inode: u64) -> Option<HdfsPath> {
        self.inode_to_entry.get(&inode).map(|e| e.path.clone())
    }

    /// Inode currently mapped to `path`.
    pub fn get_inode(&self, path: &HdfsPath) -> Option<u64> {
        self.path_to_inode.get(path).map(|r| *r)
    }

    /// Releases `nlookup` kernel references. Returns true if the inode was evicted.
    pub fn forget(&self, inode: u64, nlookup: u64) -> bool {
        if inode == ROOT_INODE {
            return false;
        }
        let remaining = match self.inode_to_entry.get(&inode) {
            Some(entry) => entry.dec_nlookup(nlookup),
            None => return false,
        };
        if remaining == Some(0)
            && let Some((_, entry)) = self.inode_to_entry.remove(&inode)
        {
            // Only drop the path mapping if it still points at this inode.
            self.path_to_inode
                .remove_if(&entry.path, |_, mapped| *mapped == inode);
            return true;
        }
        false
    }

    /// Removes the path mapping after a delete; the entry lives until forgotten.
    pub fn invalidate_path(&self, path: &HdfsPath) {
        self.path_to_inode.remove(path);
    }

    /// Moves an inode, and every inode below it, to a new path after a rename.
    pub fn update_path(&self, old_path: &HdfsPath, new_path: HdfsPath) {
        // Whatever was at the destination is replaced.
        self.path_to_inode.remove(&new_path);

        let moved: Vec<(HdfsPath, u64, HdfsPath)> = self
            .path_to_inode
            .iter()
            .filter_map(|mapping| {
                let rebased = mapping.key().rebase(old_path, &new_path)?;
                Some((mapping.key().clone(), *mapping.value(), rebased))
            })
            .collect();

        for (from, inode, to) in moved {
            self.path_to_inode.remove(&from);
            if let Some(mut entry) = self.inode_to_entry.get_mut(&inode) {
                entry.path = to.clone();
            }
            self.path_to_inode.insert(to, inode);
        }
    }

    /// Number of inodes currently in the table, root included.
    pub fn len(&self) -> usize {
        self.inode_to_entry.len()
    }

    /// Returns true if only the root inode is present.
    pub fn is_empty(&self) -> bool {
        self.inode_to_entry.len() <= 1
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
