//! Connection configuration for a WebHDFS endpoint.
//!
//! Settings are read from `config.toml` in the platform configuration
//! directory (`~/.config/webhdfs/config.toml` on Linux) and may then be
//! overridden field by field from the command line. A missing file yields
//! the defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default namenode HTTP port.
pub const DEFAULT_PORT: u16 = 50070;

/// Default SOCKS proxy port.
pub const DEFAULT_PROXY_PORT: u16 = 1080;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the WebHDFS REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Namenode or gateway host name.
    pub host: String,
    /// Namenode or gateway port.
    pub port: u16,
    /// Route requests through an Apache Knox gateway (HTTPS + basic auth).
    pub use_knox: bool,
    /// Knox topology name (`/gateway/<topology>/webhdfs/v1`).
    pub knox_topology: String,
    /// PEM CA certificate used to verify the gateway.
    pub cert: Option<PathBuf>,
    /// HDFS user name. Sent as `user.name` for direct access, as basic auth through Knox.
    pub username: Option<String>,
    /// Gateway password. Never written back to disk.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// SOCKS5 proxy host; requests are tunnelled when set.
    pub proxy_host: Option<String>,
    /// SOCKS5 proxy port.
    pub proxy_port: u16,
    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            use_knox: false,
            knox_topology: "default".to_string(),
            cert: None,
            username: None,
            password: None,
            proxy_host: None,
            proxy_port: DEFAULT_PROXY_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Default configuration file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = directories::ProjectDirs::from("org", "apache", "webhdfs")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load the configuration from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded connection config");
        Ok(config)
    }

    /// Root URL of the REST API, without a trailing slash.
    ///
    /// Direct access uses `http://host:port/webhdfs/v1`; Knox uses
    /// `https://host:port/gateway/<topology>/webhdfs/v1`.
    pub fn base_url(&self) -> String {
        if self.use_knox {
            format!(
                "https://{}:{}/gateway/{}/webhdfs/v1",
                self.host, self.port, self.knox_topology
            )
        } else {
            format!("http://{}:{}/webhdfs/v1", self.host, self.port)
        }
    }

    /// SOCKS5 proxy URL, resolving host names on the proxy side.
    pub fn proxy_url(&self) -> Option<String> {
        self.proxy_host
            .as_ref()
            .map(|host| format!("socks5h://{}:{}", host, self.proxy_port))
    }
}
