//! Gateway credential resolution.
//!
//! Credentials are only needed when routing through Knox. Each field is
//! taken from the first source that provides it:
//!
//! 1. `HDFS_USERNAME` / `HDFS_PASSWORD` environment variables
//! 2. the `machine` entry for the configured host in `$NETRC` or
//!    `~/.netrc` (or its `default` entry)
//! 3. the connection configuration
//! 4. an interactive prompt
//!
//! The user name is lower-cased, matching how HDFS principals are stored.

use crate::config::ConnectionConfig;
use crate::error::ConfigError;
use directories::BaseDirs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

/// Environment variable overriding the user name.
pub const USERNAME_ENV: &str = "HDFS_USERNAME";

/// Environment variable overriding the password.
pub const PASSWORD_ENV: &str = "HDFS_PASSWORD";

/// Environment variable naming the netrc file to use instead of `~/.netrc`.
pub const NETRC_ENV: &str = "NETRC";

/// What an interactive prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// The user name (echoed).
    Username,
    /// The password (not echoed).
    Password,
}

/// Resolved gateway credentials.
pub struct Credentials {
    /// Lower-cased user name.
    pub username: String,
    /// Password, wiped from memory on drop.
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login for one host taken from a netrc file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NetrcLogin {
    /// `login` token, if non-empty.
    pub login: Option<String>,
    /// `password` token.
    pub password: Option<String>,
}

impl std::fmt::Debug for NetrcLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetrcLogin")
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl NetrcLogin {
    /// Default netrc location: `$NETRC`, else `~/.netrc`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(NETRC_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        BaseDirs::new().map(|dirs| dirs.home_dir().join(".netrc"))
    }

    /// Entry for `host` in the netrc file at `path`.
    ///
    /// A missing file is not an error and yields `None`.
    pub fn from_file(path: &Path, host: &str) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let login = Self::parse(&contents, host).map_err(|reason| ConfigError::Netrc {
            path: path.to_path_buf(),
            reason,
        })?;
        if login.is_some() {
            debug!(path = %path.display(), host, "Using netrc entry");
        }
        Ok(login)
    }

    /// Entry for `host` in netrc-formatted `contents`, falling back to the
    /// `default` entry.
    pub fn parse(contents: &str, host: &str) -> Result<Option<Self>, String> {
        let netrc = netrc::Netrc::parse(contents.as_bytes()).map_err(|e| format!("{e:?}"))?;
        let machine = netrc
            .hosts
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(host))
            .map(|(_, machine)| machine)
            .or(netrc.default);
        Ok(machine.map(|machine| Self {
            login: Some(machine.login).filter(|login| !login.is_empty()),
            password: machine.password,
        }))
    }
}

impl Credentials {
    /// Resolve credentials from the process environment, the netrc file, the
    /// config and the terminal.
    pub fn resolve(config: &ConnectionConfig) -> Result<Self, ConfigError> {
        let netrc = match NetrcLogin::default_path() {
            Some(path) => NetrcLogin::from_file(&path, &config.host)?,
            None => None,
        };
        Self::resolve_with(
            config,
            |key| std::env::var(key).ok(),
            netrc,
            |kind| match kind {
                PromptKind::Username => prompt_line("HDFS username: "),
                PromptKind::Password => rpassword::prompt_password("HDFS password: "),
            },
        )
    }

    /// Resolve credentials with injectable environment lookup, netrc entry
    /// and prompt.
    pub fn resolve_with<E, P>(
        config: &ConnectionConfig,
        env: E,
        netrc: Option<NetrcLogin>,
        mut prompt: P,
    ) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
        P: FnMut(PromptKind) -> io::Result<String>,
    {
        let NetrcLogin {
            login: netrc_login,
            password: netrc_password,
        } = netrc.unwrap_or_default();

        let username = match first_non_empty([
            env(USERNAME_ENV),
            netrc_login,
            config.username.clone(),
        ]) {
            Some(name) => name,
            None => prompt(PromptKind::Username).map_err(ConfigError::Prompt)?,
        };
        let password = match first_non_empty([
            env(PASSWORD_ENV),
            netrc_password,
            config.password.clone(),
        ]) {
            Some(pw) => pw,
            None => prompt(PromptKind::Password).map_err(ConfigError::Prompt)?,
        };

        Ok(Self {
            username: username.trim().to_lowercase(),
            password: Zeroizing::new(password),
        })
    }
}

fn first_non_empty<const N: usize>(sources: [Option<String>; N]) -> Option<String> {
    sources.into_iter().flatten().find(|s| !s.is_empty())
}

fn prompt_line(message: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    stderr.write_all(message.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
