//! Command-line and config-file settings.

use crate::error::{Result, ServerError};
use animal_rescue_adoption::DEFAULT_PICKUP_LOCATION;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8432";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// JSON-RPC over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP on `/mcp`
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "animal-rescue-mcp", version, about)]
pub struct Args {
    /// YAML config file
    #[arg(long, env = "ANIMAL_RESCUE_CONFIG")]
    pub config: Option<PathBuf>,

    /// MCP transport
    #[arg(long, value_enum, env = "ANIMAL_RESCUE_TRANSPORT")]
    pub transport: Option<TransportKind>,

    /// Bind address for the HTTP transport
    #[arg(long, env = "ANIMAL_RESCUE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Catalog file (YAML or JSON) replacing the built-in seed data
    #[arg(long, env = "ANIMAL_RESCUE_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Pickup location printed on adoption certificates
    #[arg(long, env = "ANIMAL_RESCUE_PICKUP_LOCATION")]
    pub pickup_location: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, env = "ANIMAL_RESCUE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, env = "ANIMAL_RESCUE_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// On-disk config. Every key is optional; CLI flags win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub transport: Option<TransportKind>,
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    /// Relative paths are resolved against the config file's directory.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub pickup_location: Option<String>,
}

impl FileConfig {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("read config {}: {e}", path.display()))
        })?;
        let mut cfg: Self = serde_yaml::from_str(&raw)?;

        if let Some(catalog) = cfg.catalog.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            cfg.catalog = Some(if catalog.is_relative() {
                base.join(catalog)
            } else {
                catalog
            });
        }
        Ok(cfg)
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub transport: TransportKind,
    pub bind: SocketAddr,
    pub catalog: Option<PathBuf>,
    pub pickup_location: String,
}

impl Settings {
    /// Merge CLI/env arguments over the optional config file over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the named config file is unreadable or any value is invalid.
    pub fn resolve(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: &Args, file: FileConfig) -> Result<Self> {
        let bind = match args.bind.or(file.bind) {
            Some(addr) => addr,
            None => DEFAULT_BIND
                .parse()
                .map_err(|e| ServerError::Config(format!("default bind address: {e}")))?,
        };

        let pickup_location = args
            .pickup_location
            .clone()
            .or(file.pickup_location)
            .unwrap_or_else(|| DEFAULT_PICKUP_LOCATION.to_string());
        if pickup_location.trim().is_empty() {
            return Err(ServerError::Config(
                "pickup location must not be empty".to_string(),
            ));
        }

        Ok(Self {
            transport: args.transport.or(file.transport).unwrap_or_default(),
            bind,
            catalog: args.catalog.clone().or(file.catalog),
            pickup_location,
        })
    }
}
