//! fuser adapter for the WebHDFS dispatcher.
//!
//! The kernel talks in inode numbers and `(parent, name)` pairs; the
//! [`Dispatcher`] talks in HDFS paths. [`WebHdfsFs`] translates between the
//! two through the [`InodeTable`] and converts [`PosixAttr`] records into
//! fuser's [`FileAttr`].
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | lookup / forget | lookup counts kept in the inode table |
//! | getattr | served from the attribute cache when fresh |
//! | setattr | mode/uid/gid/times ignored; size only to 0 or unchanged |
//! | readdir | `.` and `..` added here, child kinds stored with the listing |
//! | read / write | stateless, no file handles; writes must append |
//! | create / mkdir | permission is `mode & !umask` |
//! | unlink / rmdir | recursive delete on the backend |
//! | rename | same directory only; other directories answer `EXDEV`, `RENAME_EXCHANGE` answers `EINVAL` |

use crate::config::{MAX_WRITE, MountConfig};
use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::{FsError, FsResult};
use crate::inode::{InodeTable, ROOT_INODE, UNKNOWN_INODE};
use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use libc::c_int;
use std::ffi::OsStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, trace, warn};
use webhdfs_core::{HdfsPath, RemoteStorage};
use webhdfs_mount::{AccountLookup, CacheStore, PosixAttr, SystemAccounts};

/// FUSE filesystem backed by a WebHDFS namespace.
pub struct WebHdfsFs<R, A = SystemAccounts> {
    dispatcher: Dispatcher<R, A>,
    inodes: InodeTable,
    kernel_ttl: Duration,
}

impl<R: RemoteStorage> WebHdfsFs<R, SystemAccounts> {
    /// Creates a filesystem over `remote` with caches sized by `config`.
    pub fn new(remote: R, config: &MountConfig) -> Self {
        let dispatcher = Dispatcher::new(remote, CacheStore::new(config.cache_ttls()));
        Self::with_dispatcher(dispatcher, config)
    }
}

impl<R: RemoteStorage, A: AccountLookup> WebHdfsFs<R, A> {
    /// Creates a filesystem around an existing dispatcher.
    pub fn with_dispatcher(dispatcher: Dispatcher<R, A>, config: &MountConfig) -> Self {
        Self {
            dispatcher,
            inodes: InodeTable::new(),
            kernel_ttl: config.kernel_ttl,
        }
    }

    /// The underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<R, A> {
        &self.dispatcher
    }

    /// The inode table.
    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    fn path_of(&self, ino: u64) -> FsResult<HdfsPath> {
        self.inodes.path_of(ino).ok_or(FsError::InvalidInode(ino))
    }

    fn child_path(&self, parent: u64, name: &OsStr) -> FsResult<HdfsPath> {
        let name = valid_name(name)?;
        Ok(self.path_of(parent)?.join(name))
    }

    /// Attributes of `path` registered under an inode, counting one kernel lookup.
    fn entry_for(&self, path: HdfsPath) -> FsResult<FileAttr> {
        let attr = self.dispatcher.get_attributes(&path)?;
        let ino = self.inodes.get_or_insert(path);
        Ok(to_file_attr(ino, &attr))
    }

    fn apply_setattr(
        &self,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        times_changed: bool,
    ) -> FsResult<FileAttr> {
        let path = self.path_of(ino)?;
        if let Some(mode) = mode {
            self.dispatcher.chmod(&path, mode);
        }
        if uid.is_some() || gid.is_some() {
            self.dispatcher.chown(&path, uid, gid);
        }
        if let Some(size) = size
            && self.dispatcher.truncate(&path, size)? == Outcome::Applied
        {
            info!(path = %path, "Truncated to zero");
        }
        if times_changed {
            debug!(path = %path, "Ignoring timestamp update");
        }
        let attr = self.dispatcher.get_attributes(&path)?;
        Ok(to_file_attr(ino, &attr))
    }

    /// Entries of directory `ino` as readdir reports them, `.` and `..` first.
    pub fn directory_entries(&self, ino: u64) -> FsResult<Vec<(u64, FileType, String)>> {
        let path = self.path_of(ino)?;
        let listing = self.dispatcher.list_directory(&path)?;
        let parent_ino = path
            .parent()
            .and_then(|p| self.inodes.get_inode(&p))
            .unwrap_or(ROOT_INODE);

        let mut entries = Vec::with_capacity(listing.len() + 2);
        entries.push((ino, FileType::Directory, ".".to_string()));
        entries.push((parent_ino, FileType::Directory, "..".to_string()));
        for entry in listing.iter() {
            let kind = if entry.is_dir {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            let child_ino = self
                .inodes
                .get_inode(&path.join(&entry.name))
                .unwrap_or(UNKNOWN_INODE);
            entries.push((child_ino, kind, entry.name.clone()));
        }
        Ok(entries)
    }

    /// Renames `name` in `parent` to `newname` in `newparent`.
    ///
    /// The backend never replaces an existing destination, so
    /// `RENAME_NOREPLACE` is honoured as a plain rename.
    pub fn rename_entry(
        &self,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
    ) -> FsResult<()> {
        if flags & !RENAME_NOREPLACE != 0 {
            return Err(FsError::UnsupportedRenameFlags(flags));
        }
        if parent != newparent {
            return Err(FsError::CrossDirectoryRename);
        }
        let old_path = self.child_path(parent, name)?;
        let new_name = valid_name(newname)?;
        let new_path = self.dispatcher.rename(&old_path, new_name)?;
        self.inodes.update_path(&old_path, new_path);
        Ok(())
    }
}

/// `renameat2` flag asking not to replace an existing destination.
const RENAME_NOREPLACE: u32 = 1;

fn valid_name(name: &OsStr) -> FsResult<&str> {
    match name.to_str() {
        Some(s) if !s.is_empty() && s != "." && s != ".." && !s.contains('/') => Ok(s),
        _ => Err(FsError::InvalidName(name.to_os_string())),
    }
}

fn to_system_time(secs: f64) -> SystemTime {
    UNIX_EPOCH + Duration::try_from_secs_f64(secs).unwrap_or_default()
}

/// Converts translated attributes into fuser's representation.
pub fn to_file_attr(ino: u64, attr: &PosixAttr) -> FileAttr {
    let mtime = to_system_time(attr.mtime);
    let perm = u16::try_from(attr.permissions()).unwrap_or(0o7777);
    FileAttr {
        ino,
        size: attr.size,
        blocks: attr.blocks,
        atime: to_system_time(attr.atime),
        mtime,
        ctime: to_system_time(attr.ctime),
        crtime: mtime,
        kind: if attr.is_dir() {
            FileType::Directory
        } else {
            FileType::RegularFile
        },
        perm,
        nlink: attr.nlink,
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: u32::try_from(attr.blksize).unwrap_or(u32::MAX),
        flags: 0,
    }
}

impl<R, A> Filesystem for WebHdfsFs<R, A>
where
    R: RemoteStorage,
    A: AccountLookup,
{
    fn init(&mut self, _req: &Request<'_>, config: &mut KernelConfig) -> Result<(), c_int> {
        if let Err(nearest) = config.set_max_write(MAX_WRITE) {
            warn!(requested = MAX_WRITE, nearest, "Kernel rejected max_write");
        }
        info!("WebHDFS filesystem initialized");
        Ok(())
    }

    fn destroy(&mut self) {
        self.dispatcher.cache().stats().log_summary();
        info!(inodes = self.inodes.len(), "WebHDFS filesystem destroyed");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        trace!(parent, name = ?name, "lookup");
        match self
            .child_path(parent, name)
            .and_then(|path| self.entry_for(path))
        {
            Ok(attr) => reply.entry(&self.kernel_ttl, &attr, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        trace!(inode = ino, nlookup, "forget");
        self.inodes.forget(ino, nlookup);
    }

    fn batch_forget(&mut self, _req: &Request<'_>, nodes: &[fuser::fuse_forget_one]) {
        trace!(count = nodes.len(), "batch_forget");
        for node in nodes {
            self.inodes.forget(node.nodeid, node.nlookup);
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        trace!(inode = ino, "getattr");
        let result = self
            .path_of(ino)
            .and_then(|path| self.dispatcher.get_attributes(&path));
        match result {
            Ok(attr) => reply.attr(&self.kernel_ttl, &to_file_attr(ino, &attr)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        trace!(inode = ino, ?mode, ?uid, ?gid, ?size, "setattr");
        let times_changed = atime.is_some() || mtime.is_some();
        match self.apply_setattr(ino, mode, uid, gid, size, times_changed) {
            Ok(attr) => reply.attr(&self.kernel_ttl, &attr),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, "open");
        match self.path_of(ino) {
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!(inode = ino, offset, size, "read");
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self
            .path_of(ino)
            .and_then(|path| self.dispatcher.read(&path, size, offset))
        {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        trace!(inode = ino, offset, len = data.len(), "write");
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self
            .path_of(ino)
            .and_then(|path| self.dispatcher.write(&path, data, offset))
        {
            Ok(written) => reply.written(u32::try_from(written).unwrap_or(u32::MAX)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, "opendir");
        match self
            .path_of(ino)
            .and_then(|path| self.dispatcher.get_attributes(&path))
        {
            Ok(attr) if attr.is_dir() => reply.opened(0, 0),
            Ok(_) => reply.error(libc::ENOTDIR),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!(inode = ino, offset, "readdir");
        let entries = match self.directory_entries(ino) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or(0);
        for (index, (entry_ino, kind, name)) in entries.iter().enumerate().skip(skip) {
            let next_offset = i64::try_from(index + 1).unwrap_or(i64::MAX);
            if reply.add(*entry_ino, next_offset, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        trace!(parent, name = ?name, mode, "create");
        let result = self.child_path(parent, name).and_then(|path| {
            self.dispatcher.create(&path, mode & !umask)?;
            self.entry_for(path)
        });
        match result {
            Ok(attr) => reply.created(&self.kernel_ttl, &attr, 0, 0, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        reply: ReplyEntry,
    ) {
        trace!(parent, name = ?name, mode, "mkdir");
        let result = self.child_path(parent, name).and_then(|path| {
            self.dispatcher.mkdir(&path, mode & !umask)?;
            self.entry_for(path)
        });
        match result {
            Ok(attr) => reply.entry(&self.kernel_ttl, &attr, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        trace!(parent, name = ?name, "unlink");
        let result = self.child_path(parent, name).and_then(|path| {
            self.dispatcher.unlink(&path)?;
            self.inodes.invalidate_path(&path);
            Ok(())
        });
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        trace!(parent, name = ?name, "rmdir");
        let result = self.child_path(parent, name).and_then(|path| {
            self.dispatcher.rmdir(&path)?;
            self.inodes.invalidate_path(&path);
            Ok(())
        });
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        trace!(parent, name = ?name, newparent, newname = ?newname, flags, "rename");
        match self.rename_entry(parent, name, newparent, newname, flags) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }
}
