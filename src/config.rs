//! Configuration management for Socket Monitor
//!
//! Defaults for which tables to read and how to print them, persisted as
//! TOML. Command-line flags override whatever is loaded here.

use crate::error::{Error, Result};
use crate::source::{TableKind, DEFAULT_PROC_ROOT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Socket Monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which connection tables to read
    #[serde(default)]
    pub sources: SourceConfig,
    /// Table rendering options
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Connection table selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// procfs mount point
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    /// Read the TCP tables
    #[serde(default = "default_true")]
    pub tcp: bool,
    /// Read the UDP tables
    #[serde(default = "default_true")]
    pub udp: bool,
    /// Also read tcp6/udp6
    #[serde(default)]
    pub include_ipv6: bool,
}

/// Table rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Print numeric addresses and uids instead of names
    #[serde(default)]
    pub numeric: bool,
    /// Show Recv-Q/Send-Q columns
    #[serde(default)]
    pub show_queues: bool,
    /// Show the inode column
    #[serde(default)]
    pub show_inode: bool,
    /// Report how many lines were skipped as malformed
    #[serde(default = "default_true")]
    pub report_malformed: bool,
}

fn default_proc_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROC_ROOT)
}

fn default_true() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
            tcp: true,
            udp: true,
            include_ipv6: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            numeric: false,
            show_queues: false,
            show_inode: false,
            report_malformed: true,
        }
    }
}

impl SourceConfig {
    /// Tables selected by this configuration, IPv4 before IPv6
    pub fn tables(&self) -> Vec<TableKind> {
        TableKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                TableKind::Tcp => self.tcp,
                TableKind::Udp => self.udp,
                TableKind::Tcp6 => self.tcp && self.include_ipv6,
                TableKind::Udp6 => self.udp && self.include_ipv6,
            })
            .collect()
    }
}

impl Config {
    /// Get the default configuration directory
    ///
    /// Returns `~/.config/sockmon` (or `./.config/sockmon` without `$HOME`).
    pub fn default_path() -> PathBuf {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".config"))
            .join("sockmon")
    }

    /// Load configuration from the default path
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_file = Self::default_path().join("config.toml");

        if !config_file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::default_path();
        std::fs::create_dir_all(&config_dir)?;
        self.save_to(&config_dir.join("config.toml"))
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
