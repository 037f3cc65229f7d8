//! mount-webhdfs - Mount a WebHDFS namespace as a FUSE filesystem.
//!
//! Usage: mount-webhdfs [OPTIONS] <MOUNTPOINT>
//!
//! Connection settings come from `~/.config/webhdfs/config.toml` (or
//! `--config`); any flag given on the command line overrides the file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use webhdfs_core::{ConnectionConfig, Credentials, WebHdfsClient};
use webhdfs_fuse::{MountConfig, WebHdfsFs};

#[derive(Parser)]
#[command(name = "mount-webhdfs")]
#[command(about = "Mount a WebHDFS namespace as a FUSE filesystem")]
#[command(version)]
struct Cli {
    /// Mountpoint for the filesystem
    mountpoint: PathBuf,

    /// Connection config file (default: ~/.config/webhdfs/config.toml)
    #[arg(short, long, env = "WEBHDFS_CONFIG")]
    config: Option<PathBuf>,

    /// Namenode or Knox gateway host
    #[arg(long, env = "WEBHDFS_HOST")]
    host: Option<String>,

    /// Namenode or Knox gateway port
    #[arg(long, env = "WEBHDFS_PORT")]
    port: Option<u16>,

    /// Route requests through an Apache Knox gateway
    #[arg(long)]
    knox: bool,

    /// Knox topology name
    #[arg(long)]
    topology: Option<String>,

    /// PEM CA certificate for the gateway
    #[arg(long)]
    cert: Option<PathBuf>,

    /// SOCKS5 proxy host
    #[arg(long)]
    proxy_host: Option<String>,

    /// SOCKS5 proxy port
    #[arg(long)]
    proxy_port: Option<u16>,

    /// HDFS user name
    #[arg(short, long, env = "HDFS_USERNAME")]
    user: Option<String>,

    /// Lifetime of cached metadata (e.g. "30s", "2m")
    #[arg(long, value_parser = humantime::parse_duration)]
    cache_ttl: Option<Duration>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Mount as read-only (default: read-write)
    #[arg(long)]
    read_only: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut ConnectionConfig) {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.knox {
            config.use_knox = true;
        }
        if let Some(topology) = &self.topology {
            config.knox_topology.clone_from(topology);
        }
        if let Some(cert) = &self.cert {
            config.cert = Some(cert.clone());
        }
        if let Some(proxy_host) = &self.proxy_host {
            config.proxy_host = Some(proxy_host.clone());
        }
        if let Some(proxy_port) = self.proxy_port {
            config.proxy_port = proxy_port;
        }
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
    }

    fn mount_config(&self) -> MountConfig {
        let config = match self.cache_ttl {
            Some(ttl) => MountConfig::with_cache_ttl(ttl),
            None => MountConfig::default(),
        };
        config.read_only(self.read_only)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    if !cli.mountpoint.exists() {
        anyhow::bail!("Mountpoint does not exist: {}", cli.mountpoint.display());
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ConnectionConfig::default_path().context("Failed to locate config file")?,
    };
    let mut connection = ConnectionConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    cli.apply_overrides(&mut connection);

    let credentials = if connection.use_knox {
        Some(Credentials::resolve(&connection).context("Failed to read gateway credentials")?)
    } else {
        None
    };

    info!(base = %connection.base_url(), "Connecting to WebHDFS");
    let client = WebHdfsClient::connect(&connection, credentials)
        .context("Failed to initialize WebHDFS client")?;

    let mount_config = cli.mount_config();
    let fs = WebHdfsFs::new(client, &mount_config);

    mount_and_wait(&cli.mountpoint, &connection.host, &mount_config, fs)
}

/// Install the tracing subscriber. The returned guard flushes the log file on drop.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = if cli.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .with(env_filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(env_filter)
                .init();
            Ok(None)
        }
    }
}

/// Mount the filesystem and wait for Ctrl+C or SIGTERM.
fn mount_and_wait(
    mountpoint: &Path,
    host: &str,
    config: &MountConfig,
    fs: WebHdfsFs<WebHdfsClient>,
) -> Result<()> {
    let mut options = vec![
        fuser::MountOption::FSName(format!("webhdfs:{host}")),
        fuser::MountOption::Subtype("webhdfs".to_string()),
        fuser::MountOption::AutoUnmount,
    ];

    #[cfg(target_os = "macos")]
    options.push(fuser::MountOption::CUSTOM(format!("volname={host}")));

    if config.read_only {
        options.push(fuser::MountOption::RO);
    } else {
        options.push(fuser::MountOption::RW);
    }

    let (tx, rx) = mpsc::channel::<()>();

    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to set signal handler")?;

    info!("Mounting filesystem (press Ctrl+C to unmount)");

    let session = fuser::spawn_mount2(fs, mountpoint, &options).map_err(|e| {
        error!(error = %e, "Mount failed");
        anyhow::anyhow!("Failed to mount filesystem: {e}")
    })?;

    info!("Filesystem mounted at {}", mountpoint.display());

    match rx.recv() {
        Ok(()) => info!("Received interrupt signal, unmounting..."),
        Err(_) => warn!("Signal channel closed unexpectedly"),
    }

    drop(session);
    info!("Filesystem unmounted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let cli = Cli::parse_from([
            "mount-webhdfs",
            "/mnt/hdfs",
            "--host",
            "gw.example.org",
            "--port",
            "8443",
            "--knox",
            "--topology",
            "prod",
            "--proxy-host",
            "localhost",
            "--user",
            "alice",
        ]);
        let mut config = ConnectionConfig {
            host: "namenode".to_string(),
            proxy_port: 9050,
            ..Default::default()
        };
        cli.apply_overrides(&mut config);

        assert_eq!(config.host, "gw.example.org");
        assert_eq!(config.port, 8443);
        assert!(config.use_knox);
        assert_eq!(config.knox_topology, "prod");
        assert_eq!(config.proxy_url().as_deref(), Some("socks5h://localhost:9050"));
        assert_eq!(config.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let cli = Cli::parse_from(["mount-webhdfs", "/mnt/hdfs"]);
        let original = ConnectionConfig {
            host: "namenode".to_string(),
            port: 9870,
            username: Some("hdfs".to_string()),
            ..Default::default()
        };
        let mut config = original.clone();
        cli.apply_overrides(&mut config);
        // HDFS_USERNAME may be set in the test environment.
        if std::env::var_os("HDFS_USERNAME").is_none() {
            assert_eq!(config, original);
        }
    }

    #[test]
    fn test_cache_ttl_flag() {
        let cli = Cli::parse_from(["mount-webhdfs", "/mnt", "--cache-ttl", "2m", "--read-only"]);
        let config = cli.mount_config();
        assert_eq!(config.attr_ttl, Duration::from_secs(120));
        assert_eq!(config.listing_ttl, Duration::from_secs(120));
        assert_eq!(config.negative_ttl, Duration::from_secs(120));
        assert!(config.read_only);
    }
}
