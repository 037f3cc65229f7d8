//! Error types for the WebHDFS client and its configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a [`RemoteStorage`](crate::RemoteStorage) implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The path does not exist on the backend.
    #[error("path not found: {path}")]
    NotFound {
        /// Path as sent to the backend.
        path: String,
    },

    /// A directory operation was issued against a file.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// Path as sent to the backend.
        path: String,
    },

    /// The backend refused the operation for the authenticated user.
    #[error("permission denied on {path}: {message}")]
    PermissionDenied {
        /// Path as sent to the backend.
        path: String,
        /// Backend-provided message.
        message: String,
    },

    /// Gateway authentication failed (HTTP 401).
    #[error("authentication rejected by gateway")]
    Unauthorized,

    /// The backend answered `{"boolean": false}` to a mutating call.
    #[error("{op} rejected by backend for {path}")]
    Rejected {
        /// WebHDFS operation name.
        op: &'static str,
        /// Path as sent to the backend.
        path: String,
    },

    /// Any other non-success HTTP response.
    #[error("HTTP {status} from backend: {exception}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Java exception name from the `RemoteException` body, if any.
        exception: String,
        /// Backend-provided message.
        message: String,
    },

    /// A two-step operation did not receive the expected redirect.
    #[error("{op} did not redirect to a datanode")]
    MissingRedirect {
        /// WebHDFS operation name.
        op: &'static str,
    },

    /// Transport-level failure (connect, TLS, proxy, timeout).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("failed to decode {op} response: {source}")]
    Decode {
        /// WebHDFS operation name.
        op: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured CA certificate could not be read.
    #[error("failed to read certificate {path}: {source}")]
    Certificate {
        /// Certificate file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configured base URL or proxy URL is malformed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parse failure.
        reason: String,
    },
}

impl ClientError {
    /// Returns true if the error means the path is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Returns true if the request timed out in transit.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}

/// Result type for remote storage calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors loading or completing the connection configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`ConnectionConfig`](crate::ConnectionConfig).
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// No platform configuration directory could be determined.
    #[error("failed to determine configuration directory")]
    NoConfigDir,

    /// The netrc file exists but could not be parsed.
    #[error("failed to parse netrc file {path}: {reason}")]
    Netrc {
        /// Netrc file path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Interactive credential prompt failed.
    #[error("failed to read credentials: {0}")]
    Prompt(#[source] io::Error),
}
