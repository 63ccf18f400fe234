//! Runtime configuration
//!
//! Priority: command line > environment (`INWARD_*`) > TOML file > defaults.

use clap::Parser;
use inward_common::config::{
    database_path, resolve_root_folder, QcPolicy, TomlConfig, DEFAULT_BIND_ADDR,
    DEFAULT_EVENT_CAPACITY, DEFAULT_MIRROR_TIMEOUT_MS, DEFAULT_NAMESPACE,
    DEFAULT_SYNC_STATUS_CAPACITY,
};
use inward_common::time::millis_to_duration;
use inward_common::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for inward-gate
#[derive(Parser, Debug, Default)]
#[command(name = "inward-gate")]
#[command(about = "Warehouse inward register service")]
#[command(version)]
pub struct Args {
    /// Config file (default: platform config dir, inward/config.toml)
    #[arg(short, long, env = "INWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder holding the database files
    #[arg(short, long, env = "INWARD_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "INWARD_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Application partition; each namespace has its own database
    #[arg(short, long, env = "INWARD_NAMESPACE")]
    pub namespace: Option<String>,

    /// Mirror export endpoint; export is disabled when unset
    #[arg(long, env = "INWARD_MIRROR_URL")]
    pub mirror_url: Option<String>,

    /// Mirror request timeout in milliseconds
    #[arg(long, env = "INWARD_MIRROR_TIMEOUT_MS")]
    pub mirror_timeout_ms: Option<u64>,

    /// Who may approve or reject entries: any_role or admin_only
    #[arg(long, env = "INWARD_QC_POLICY")]
    pub qc_policy: Option<String>,

    /// Lifecycle event buffer size
    #[arg(long, env = "INWARD_EVENT_CAPACITY")]
    pub event_capacity: Option<usize>,

    /// How many recent entries keep a queryable mirror status
    #[arg(long, env = "INWARD_SYNC_STATUS_CAPACITY")]
    pub sync_status_capacity: Option<usize>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub root_folder: PathBuf,
    pub bind_addr: SocketAddr,
    pub namespace: String,
    pub mirror_url: Option<String>,
    pub mirror_timeout: Duration,
    pub qc_policy: QcPolicy,
    pub event_capacity: usize,
    pub sync_status_capacity: usize,
}

impl GateConfig {
    pub fn resolve(args: Args, toml: TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(args.root_folder, &toml);

        let bind_addr = args
            .bind_addr
            .or(toml.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind_addr, e)))?;

        let namespace = args
            .namespace
            .or(toml.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        if namespace.is_empty()
            || !namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Config(format!(
                "Invalid namespace '{}' (letters, digits, '-' and '_' only)",
                namespace
            )));
        }

        let qc_policy = match args.qc_policy {
            Some(raw) => raw.parse()?,
            None => toml.qc_policy.unwrap_or_default(),
        };

        let event_capacity = args
            .event_capacity
            .or(toml.event_capacity)
            .unwrap_or(DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }

        let sync_status_capacity = args
            .sync_status_capacity
            .or(toml.sync_status_capacity)
            .unwrap_or(DEFAULT_SYNC_STATUS_CAPACITY);
        if sync_status_capacity == 0 {
            return Err(Error::Config(
                "sync_status_capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            root_folder,
            bind_addr,
            namespace,
            mirror_url: args
                .mirror_url
                .or(toml.mirror_url)
                .filter(|url| !url.trim().is_empty()),
            mirror_timeout: millis_to_duration(
                args.mirror_timeout_ms
                    .or(toml.mirror_timeout_ms)
                    .unwrap_or(DEFAULT_MIRROR_TIMEOUT_MS),
            ),
            qc_policy,
            event_capacity,
            sync_status_capacity,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        database_path(&self.root_folder, &self.namespace)
    }
}
