//! Command-line arguments and their normalization into runtime settings.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use blkstat_core::registry::{DeviceRegistry, RegistryError};
use blkstat_core::sampler::FailurePolicy;
use blkstat_core::util::{DurationParseError, parse_positive_duration};

/// Interval used when the configured one is zero or negative.
pub(crate) const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Listen address used when none is configured.
pub(crate) const DEFAULT_LISTEN: &str = ":8080";

#[derive(Parser, Debug)]
#[command(
    name = "blkstat-web",
    about = "Serves per-device block I/O rates as JSON over HTTP",
    version = blkstat_core::VERSION
)]
pub(crate) struct Args {
    /// Sampling interval, e.g. "1s", "500ms", "1m30s" (bare number = seconds).
    /// Zero or negative values fall back to 1s.
    #[arg(
        long,
        default_value = "1s",
        env = "BLKSTAT_INTERVAL",
        allow_hyphen_values = true
    )]
    pub(crate) interval: String,

    /// Listen address: "9090", ":9090" or "127.0.0.1:9090".
    #[arg(long, default_value = DEFAULT_LISTEN, env = "BLKSTAT_LISTEN")]
    pub(crate) listen: String,

    /// Comma-separated block device names. Empty means "sda".
    #[arg(long, default_value = "sda", env = "BLKSTAT_DEVICES")]
    pub(crate) devices: String,

    /// Path to sysfs (for testing/containers).
    #[arg(long, default_value = "/sys", env = "BLKSTAT_SYS_PATH")]
    pub(crate) sys_path: PathBuf,

    /// What to do when a device cannot be read: "isolate" drops just that
    /// device, "exit" stops the process.
    #[arg(long, default_value = "isolate", env = "BLKSTAT_ON_ERROR")]
    pub(crate) on_error: FailurePolicy,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    pub(crate) quiet: bool,
}

#[derive(Error, Debug)]
pub(crate) enum ConfigError {
    #[error("invalid --interval: {0}")]
    Interval(#[from] DurationParseError),

    #[error("invalid --listen address '{input}': {message}")]
    Listen { input: String, message: String },

    #[error("invalid --devices: {0}")]
    Devices(#[from] RegistryError),
}

/// Validated runtime configuration.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) interval: Duration,
    /// Normalized listen string, as logged (e.g. ":8080").
    pub(crate) listen: String,
    pub(crate) listen_addr: SocketAddr,
    pub(crate) registry: DeviceRegistry,
    pub(crate) sys_path: PathBuf,
    pub(crate) policy: FailurePolicy,
}

impl Settings {
    pub(crate) fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let listen = normalize_listen(&args.listen);
        let listen_addr = resolve_listen(&listen)?;
        Ok(Self {
            interval: normalize_interval(&args.interval)?,
            listen,
            listen_addr,
            registry: DeviceRegistry::parse(&args.devices)?,
            sys_path: args.sys_path.clone(),
            policy: args.on_error,
        })
    }
}

/// Parses the interval, falling back to [`DEFAULT_INTERVAL`] when it is not positive.
pub(crate) fn normalize_interval(raw: &str) -> Result<Duration, DurationParseError> {
    Ok(parse_positive_duration(raw)?.unwrap_or(DEFAULT_INTERVAL))
}

/// Trims the listen address and turns a bare port into ":port".
pub(crate) fn normalize_listen(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        DEFAULT_LISTEN.to_string()
    } else if raw.bytes().all(|b| b.is_ascii_digit()) {
        format!(":{raw}")
    } else {
        raw.to_string()
    }
}

/// Resolves a normalized listen string; ":port" binds all interfaces.
pub(crate) fn resolve_listen(listen: &str) -> Result<SocketAddr, ConfigError> {
    let err = |message: String| ConfigError::Listen {
        input: listen.to_string(),
        message,
    };

    if let Some(port) = listen.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .map_err(|_| err(format!("'{port}' is not a valid port")))?;
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }

    if let Ok(addr) = listen.parse::<SocketAddr>() {
        return Ok(addr);
    }

    listen
        .to_socket_addrs()
        .map_err(|e| err(e.to_string()))?
        .next()
        .ok_or_else(|| err("host resolved to no addresses".to_string()))
}
