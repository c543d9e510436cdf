//! Command-line / environment configuration.
//!
//! [`Cli`] is what clap parses; [`Config`] is the validated, immutable form
//! built once at startup and shared with every scrape.

use std::fmt;
use std::net::{AddrParseError, SocketAddr};

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use kaiterra_common::Schema;

// 9660 is registered on the Prometheus default port allocations wiki page.
pub const DEFAULT_ADDR: &str = ":9660";
pub const DEFAULT_API_URL: &str = "https://api.kaiterra.com/v1/lasereggs/";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Kaiterra Laser Egg Prometheus exporter.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kaiterra-exporter",
    about = "Prometheus exporter for Kaiterra air-quality sensors",
    version
)]
pub struct Cli {
    /// HTTP address to listen on. `:PORT` listens on all interfaces.
    #[arg(long, env = "KAITERRA_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// API key for Kaiterra.
    #[arg(
        long,
        alias = "api_key",
        env = "KAITERRA_API_KEY",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true
    )]
    pub api_key: String,

    /// UUID of the device to report on.
    #[arg(
        long,
        alias = "device_uuid",
        env = "KAITERRA_DEVICE_UUID",
        default_value = "",
        hide_default_value = true
    )]
    pub device_uuid: String,

    /// Upstream API base URL; the device UUID is appended to its path.
    #[arg(long, env = "KAITERRA_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Path the scrape endpoint is served on.
    #[arg(long, env = "KAITERRA_METRICS_PATH", default_value = DEFAULT_METRICS_PATH)]
    pub metrics_path: String,
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--api-key flag required")]
    MissingApiKey,
    #[error("--device-uuid flag required")]
    MissingDeviceUuid,
    #[error("invalid listen address {addr:?}: {source}")]
    InvalidListenAddr {
        addr: String,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("invalid metrics path {0:?}: must start with '/', differ from '/', and use only URL-safe characters")]
    InvalidMetricsPath(String),
}

// ── Validated config ────────────────────────────────────────────────

/// Immutable runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub api_key: String,
    pub device_uuid: String,
    /// Base URL, always ending in `/`.
    pub api_url: Url,
    pub metrics_path: String,
    pub schema: Schema,
}

impl Config {
    /// Validate parsed arguments.
    ///
    /// Blank credentials are rejected; non-blank ones are kept byte-for-byte.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if cli.device_uuid.trim().is_empty() {
            return Err(ConfigError::MissingDeviceUuid);
        }

        Ok(Self {
            listen_addr: parse_listen_addr(&cli.addr)?,
            api_key: cli.api_key,
            device_uuid: cli.device_uuid,
            api_url: parse_api_url(&cli.api_url)?,
            metrics_path: validate_metrics_path(&cli.metrics_path)?,
            schema: Schema::default(),
        })
    }
}

// The API key must never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("api_key", &"<redacted>")
            .field("device_uuid", &self.device_uuid)
            .field("api_url", &self.api_url.as_str())
            .field("metrics_path", &self.metrics_path)
            .finish()
    }
}

/// Parse a listen address, accepting the `:PORT` shorthand for all
/// interfaces.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    full.parse()
        .map_err(|source| ConfigError::InvalidListenAddr {
            addr: addr.to_string(),
            source,
        })
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    Ok(url)
}

fn validate_metrics_path(path: &str) -> Result<String, ConfigError> {
    let ok = path.len() > 1
        && path.starts_with('/')
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/-_.~".contains(c));
    if ok {
        Ok(path.to_string())
    } else {
        Err(ConfigError::InvalidMetricsPath(path.to_string()))
    }
}
