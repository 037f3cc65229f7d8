//! FUSE filesystem for a WebHDFS namespace.
//!
//! Mounts a remote HDFS directory tree, reached over the WebHDFS REST API
//! either directly or through an Apache Knox gateway, as a local
//! filesystem.
//!
//! # Architecture
//!
//! - [`WebHdfsFs`] implements [`fuser::Filesystem`] and maps inodes to paths
//! - [`Dispatcher`] runs each operation against the metadata caches and,
//!   on a miss or a mutation, the [`RemoteStorage`](webhdfs_core::RemoteStorage)
//! - [`InodeTable`] tracks inode numbers and kernel lookup counts
//!
//! # Limitations
//!
//! The backend is append-only. Writes must extend the file from its
//! current end; truncation is limited to zero length; renames are
//! confined to one directory. `chmod` and `chown` are accepted and
//! ignored.
//!
//! # Example
//!
//! ```no_run
//! use webhdfs_core::{ConnectionConfig, WebHdfsClient};
//! use webhdfs_fuse::{MountConfig, WebHdfsFs};
//!
//! let client = WebHdfsClient::connect(&ConnectionConfig::default(), None)?;
//! let fs = WebHdfsFs::new(client, &MountConfig::default());
//! fuser::mount2(fs, "/mnt/hdfs", &[fuser::MountOption::FSName("webhdfs".into())])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filesystem;
pub mod inode;

pub use config::MountConfig;
pub use dispatcher::{Dispatcher, Outcome};
pub use error::{FsError, FsResult};
pub use filesystem::WebHdfsFs;
pub use inode::InodeTable;
