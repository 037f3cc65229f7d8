//! WebHDFS access for the HDFS FUSE mount.
//!
//! This crate owns everything that talks to the remote namespace:
//!
//! - [`HdfsPath`] - normalized absolute paths inside HDFS
//! - [`FileStatus`] - the `FileStatus` JSON record returned by the namenode
//! - [`RemoteStorage`] - the request/response contract the filesystem layer is written against
//! - [`WebHdfsClient`] - a blocking `reqwest` implementation of that contract
//! - [`ConnectionConfig`] and [`Credentials`] - endpoint settings and gateway login
//!
//! Nothing here caches; every [`RemoteStorage`] call is one round-trip.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod path;
pub mod remote;
pub mod status;

pub use client::WebHdfsClient;
pub use config::ConnectionConfig;
pub use credentials::{Credentials, NetrcLogin, PromptKind};
pub use error::{ClientError, ClientResult, ConfigError};
pub use path::HdfsPath;
pub use remote::RemoteStorage;
pub use status::{FileKind, FileStatus, Permission};
