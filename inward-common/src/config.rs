//! Configuration loading and root folder resolution
//!
//! Priority order for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Arguments and environment variables are handled by the binary (clap);
//! this module provides the TOML layer and the compiled defaults.

use crate::models::Role;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5780";

/// Default application namespace; also the database file stem
pub const DEFAULT_NAMESPACE: &str = "inward-register";

/// Default bound on the single mirror export attempt
pub const DEFAULT_MIRROR_TIMEOUT_MS: u64 = 10_000;

/// Default EventBus capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default number of recent entries whose mirror status is remembered
pub const DEFAULT_SYNC_STATUS_CAPACITY: usize = 1024;

/// Who may approve or reject entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcPolicy {
    /// Admin and staff sessions may both set QC outcomes
    #[default]
    AnyRole,
    /// Only admin sessions may set QC outcomes
    AdminOnly,
}

impl QcPolicy {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            QcPolicy::AnyRole => true,
            QcPolicy::AdminOnly => role == Role::Admin,
        }
    }
}

impl FromStr for QcPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any_role" => Ok(QcPolicy::AnyRole),
            "admin_only" => Ok(QcPolicy::AdminOnly),
            other => Err(Error::Config(format!(
                "Unknown qc_policy '{}' (expected any_role or admin_only)",
                other
            ))),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub namespace: Option<String>,
    pub mirror_url: Option<String>,
    pub mirror_timeout_ms: Option<u64>,
    pub qc_policy: Option<QcPolicy>,
    pub event_capacity: Option<usize>,
    pub sync_status_capacity: Option<usize>,
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Load the TOML layer, degrading to defaults when the file is absent or broken
///
/// A missing or invalid config file never stops startup.
pub fn load_toml_config_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            info!("No config file found, using defaults");
            return TomlConfig::default();
        }
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config file: {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Locate the platform config file, if one exists
///
/// Linux also checks `/etc/inward/config.toml` after the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("inward").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/inward/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("inward"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/inward"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("inward"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/inward"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("inward"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\inward"))
    } else {
        PathBuf::from("./inward_data")
    }
}

/// Resolve the root folder: explicit value (CLI or env), then TOML, then default
pub fn resolve_root_folder(explicit: Option<PathBuf>, toml: &TomlConfig) -> PathBuf {
    explicit
        .or_else(|| toml.root_folder.clone())
        .unwrap_or_else(default_root_folder)
}

/// Database file for a namespace; each namespace is its own partition
pub fn database_path(root_folder: &Path, namespace: &str) -> PathBuf {
    root_folder.join(format!("{}.db", namespace))
}
