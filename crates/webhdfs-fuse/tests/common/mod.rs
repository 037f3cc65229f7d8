//! Shared helpers for the dispatcher tests: an in-memory namespace that
//! counts remote calls, and a fixed account database.

#![allow(dead_code)]

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webhdfs_core::{
    ClientError, ClientResult, FileKind, FileStatus, HdfsPath, Permission, RemoteStorage,
};
use webhdfs_fuse::Dispatcher;
use webhdfs_mount::{AccountLookup, CacheStore, CacheTtls, IdentityResolver};

pub const ALICE_UID: u32 = 1000;
pub const STAFF_GID: u32 = 50;
pub const NOBODY_ID: u32 = 65534;
pub const NOGROUP_GID: u32 = 65533;

/// Remote operations, as counted by [`MemoryStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Status,
    Listing,
    Read,
    Create,
    Append,
    Mkdir,
    Delete,
    Rename,
}

#[derive(Debug, Clone)]
struct Node {
    kind: FileKind,
    permission: Permission,
    owner: String,
    group: String,
    data: Vec<u8>,
    mtime: u64,
}

/// In-memory `RemoteStorage` with per-operation call counters.
#[derive(Default)]
pub struct MemoryStorage {
    nodes: Mutex<BTreeMap<String, Node>>,
    calls: Mutex<HashMap<Op, usize>>,
    appended: Mutex<Vec<Vec<u8>>>,
    refuse_renames: Mutex<bool>,
}

impl MemoryStorage {
    /// A namespace containing only `/`.
    pub fn new() -> Arc<Self> {
        let storage = Self::default();
        storage.insert("/", FileKind::Directory, Vec::new(), "hdfs", "supergroup");
        Arc::new(storage)
    }

    fn insert(&self, path: &str, kind: FileKind, data: Vec<u8>, owner: &str, group: &str) {
        let permission = if kind == FileKind::Directory {
            Permission::from_mode(0o755)
        } else {
            Permission::from_mode(0o644)
        };
        self.nodes.lock().unwrap().insert(
            path.to_string(),
            Node {
                kind,
                permission,
                owner: owner.to_string(),
                group: group.to_string(),
                data,
                mtime: 1_700_000_000_000,
            },
        );
    }

    /// Adds a file owned by alice:staff with the given contents.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        self.insert(path, FileKind::File, data.to_vec(), "alice", "staff");
    }

    /// Adds a file with explicit ownership.
    pub fn add_file_owned(&self, path: &str, data: &[u8], owner: &str, group: &str) {
        self.insert(path, FileKind::File, data.to_vec(), owner, group);
    }

    /// Adds a directory owned by alice:staff.
    pub fn add_dir(&self, path: &str) {
        self.insert(path, FileKind::Directory, Vec::new(), "alice", "staff");
    }

    /// Removes a path behind the mount's back.
    pub fn remove(&self, path: &str) {
        self.nodes.lock().unwrap().remove(path);
    }

    /// Replaces a file's contents behind the mount's back.
    pub fn set_contents(&self, path: &str, data: &[u8]) {
        if let Some(node) = self.nodes.lock().unwrap().get_mut(path) {
            node.data = data.to_vec();
        }
    }

    /// Changes a path's permission behind the mount's back.
    pub fn set_permission(&self, path: &str, mode: u32) {
        if let Some(node) = self.nodes.lock().unwrap().get_mut(path) {
            node.permission = Permission::from_mode(mode);
        }
    }

    /// Makes every rename answer `false`.
    pub fn refuse_renames(&self) {
        *self.refuse_renames.lock().unwrap() = true;
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.lock().unwrap().contains_key(path)
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.nodes.lock().unwrap().get(path).map(|n| n.data.clone())
    }

    pub fn permission(&self, path: &str) -> Option<Permission> {
        self.nodes.lock().unwrap().get(path).map(|n| n.permission)
    }

    /// Payloads of every append call, in order.
    pub fn appended(&self) -> Vec<Vec<u8>> {
        self.appended.lock().unwrap().clone()
    }

    /// Number of calls made for `op`.
    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    /// Total number of remote calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: Op) {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
    }

    fn status_of(name: &str, node: &Node) -> FileStatus {
        let children_num = 0;
        FileStatus {
            kind: node.kind,
            permission: node.permission,
            modification_time: node.mtime,
            access_time: node.mtime,
            block_size: if node.kind == FileKind::Directory {
                0
            } else {
                128 * 1024 * 1024
            },
            length: node.data.len() as u64,
            children_num,
            owner: node.owner.clone(),
            group: node.group.clone(),
            path_suffix: name.to_string(),
        }
    }

    fn not_found(path: &HdfsPath) -> ClientError {
        ClientError::NotFound {
            path: path.to_string(),
        }
    }
}

fn parent_key(key: &str) -> Option<&str> {
    if key == "/" {
        return None;
    }
    match key.rfind('/') {
        Some(0) => Some("/"),
        Some(i) => Some(&key[..i]),
        None => None,
    }
}

impl RemoteStorage for MemoryStorage {
    fn fetch_status(&self, path: &HdfsPath) -> ClientResult<FileStatus> {
        self.record(Op::Status);
        let nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get(&path.to_string())
            .ok_or_else(|| Self::not_found(path))?;
        Ok(Self::status_of("", node))
    }

    fn fetch_listing(&self, path: &HdfsPath) -> ClientResult<Vec<FileStatus>> {
        self.record(Op::Listing);
        let key = path.to_string();
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(&key).ok_or_else(|| Self::not_found(path))?;
        if node.kind != FileKind::Directory {
            return Err(ClientError::NotADirectory { path: key });
        }
        Ok(nodes
            .iter()
            .filter(|(child, _)| parent_key(child) == Some(key.as_str()))
            .map(|(child, node)| {
                let name = child.rsplit('/').next().unwrap_or_default();
                Self::status_of(name, node)
            })
            .collect())
    }

    fn read_range(&self, path: &HdfsPath, offset: u64, length: u64) -> ClientResult<Bytes> {
        self.record(Op::Read);
        let nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get(&path.to_string())
            .ok_or_else(|| Self::not_found(path))?;
        let start = usize::try_from(offset).unwrap().min(node.data.len());
        let end = start
            .saturating_add(usize::try_from(length).unwrap())
            .min(node.data.len());
        Ok(Bytes::copy_from_slice(&node.data[start..end]))
    }

    fn create_empty(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()> {
        self.record(Op::Create);
        let mut nodes = self.nodes.lock().unwrap();
        nodes.insert(
            path.to_string(),
            Node {
                kind: FileKind::File,
                permission,
                owner: "alice".to_string(),
                group: "staff".to_string(),
                data: Vec::new(),
                mtime: 1_700_000_500_000,
            },
        );
        Ok(())
    }

    fn append_bytes(&self, path: &HdfsPath, data: &[u8]) -> ClientResult<()> {
        self.record(Op::Append);
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get_mut(&path.to_string())
            .ok_or_else(|| Self::not_found(path))?;
        node.data.extend_from_slice(data);
        self.appended.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    fn make_directory(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()> {
        self.record(Op::Mkdir);
        let mut nodes = self.nodes.lock().unwrap();
        let mut key = path.to_string();
        loop {
            nodes.entry(key.clone()).or_insert_with(|| Node {
                kind: FileKind::Directory,
                permission,
                owner: "alice".to_string(),
                group: "staff".to_string(),
                data: Vec::new(),
                mtime: 1_700_000_500_000,
            });
            match parent_key(&key) {
                Some(parent) => key = parent.to_string(),
                None => break,
            }
        }
        Ok(())
    }

    fn delete(&self, path: &HdfsPath) -> ClientResult<bool> {
        self.record(Op::Delete);
        let key = path.to_string();
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.remove(&key).is_none() {
            return Ok(false);
        }
        let prefix = format!("{key}/");
        nodes.retain(|k, _| !k.starts_with(&prefix));
        Ok(true)
    }

    fn rename_path(&self, from: &HdfsPath, to: &HdfsPath) -> ClientResult<bool> {
        self.record(Op::Rename);
        if *self.refuse_renames.lock().unwrap() {
            return Ok(false);
        }
        let (from, to) = (from.to_string(), to.to_string());
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.contains_key(&to) {
            return Ok(false);
        }
        let Some(node) = nodes.remove(&from) else {
            return Ok(false);
        };
        nodes.insert(to, node);
        Ok(true)
    }
}

/// Accounts alice (uid 1000), staff (gid 50), nobody and nogroup.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedAccounts;

impl AccountLookup for FixedAccounts {
    fn uid_of(&self, name: &str) -> Option<u32> {
        match name {
            "alice" => Some(ALICE_UID),
            "nobody" => Some(NOBODY_ID),
            _ => None,
        }
    }

    fn gid_of(&self, name: &str) -> Option<u32> {
        match name {
            "staff" => Some(STAFF_GID),
            "nogroup" => Some(NOGROUP_GID),
            "nobody" => Some(NOBODY_ID),
            _ => None,
        }
    }
}

pub type TestDispatcher = Dispatcher<Arc<MemoryStorage>, FixedAccounts>;

/// Dispatcher over `storage` with a uniform cache TTL.
pub fn dispatcher_with_ttl(storage: &Arc<MemoryStorage>, ttl: Duration) -> TestDispatcher {
    Dispatcher::with_identities(
        Arc::clone(storage),
        CacheStore::new(CacheTtls::uniform(ttl)),
        IdentityResolver::new(FixedAccounts),
    )
}

/// Dispatcher over `storage` with the default 30 second TTLs.
pub fn dispatcher(storage: &Arc<MemoryStorage>) -> TestDispatcher {
    dispatcher_with_ttl(storage, webhdfs_mount::DEFAULT_TTL)
}

pub fn path(p: &str) -> HdfsPath {
    HdfsPath::new(p)
}
