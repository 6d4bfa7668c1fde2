//! Configuration file support for Stowage.
//!
//! Stowage reads two optional configuration files:
//! - Global: `~/.stowage/config.toml` - user-wide defaults
//! - Project: `stowage.toml` in the invoking directory
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.
//!
//! ```toml
//! [registry]
//! url = "https://crates.io"
//! user_agent = "stowage (ops@example.com)"
//!
//! [vendor]
//! cargo = "/opt/rust/bin/cargo"
//!
//! [layout]
//! root = "vendored_project"
//!
//! [report]
//! tool = "tokei"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://crates.io";

/// Project-local configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "stowage.toml";

/// Stowage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry settings
    pub registry: RegistryConfig,

    /// Vendoring tool settings
    pub vendor: VendorConfig,

    /// Output layout settings
    pub layout: LayoutConfig,

    /// Line-count report settings
    pub report: ReportConfig,
}

/// Registry-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry base URL (defaults to crates.io)
    pub url: Option<String>,

    /// User-Agent sent with downloads
    pub user_agent: Option<String>,

    /// Per-download timeout in seconds (None = wait indefinitely)
    pub timeout_secs: Option<u64>,
}

/// Vendoring tool configuration.
///
/// The vendor flags are not configurable: the shared tree is always
/// vendored in no-delete, versioned-directories mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Path to the cargo executable
    pub cargo: Option<PathBuf>,
}

/// Output layout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Root output directory (defaults to `vendored_project`)
    pub root: Option<PathBuf>,
}

/// Report configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Path to the line-count tool
    pub tool: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.registry.url.is_some() {
            self.registry.url = other.registry.url;
        }
        if other.registry.user_agent.is_some() {
            self.registry.user_agent = other.registry.user_agent;
        }
        if other.registry.timeout_secs.is_some() {
            self.registry.timeout_secs = other.registry.timeout_secs;
        }

        if other.vendor.cargo.is_some() {
            self.vendor.cargo = other.vendor.cargo;
        }

        if other.layout.root.is_some() {
            self.layout.root = other.layout.root;
        }

        if other.report.tool.is_some() {
            self.report.tool = other.report.tool;
        }
    }

    /// Registry base URL, falling back to crates.io.
    pub fn registry_url(&self) -> &str {
        self.registry
            .url
            .as_deref()
            .unwrap_or(DEFAULT_REGISTRY_URL)
    }

    /// User-Agent for registry downloads.
    pub fn user_agent(&self) -> String {
        self.registry
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("stowage/{}", env!("CARGO_PKG_VERSION")))
    }

    /// The cargo executable to run.
    pub fn cargo(&self) -> PathBuf {
        self.vendor
            .cargo
            .clone()
            .unwrap_or_else(|| PathBuf::from("cargo"))
    }

    /// Root output directory.
    pub fn root(&self) -> PathBuf {
        self.layout
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::core::layout::DEFAULT_ROOT))
    }

    /// The line-count tool to run.
    pub fn report_tool(&self) -> PathBuf {
        self.report
            .tool
            .clone()
            .unwrap_or_else(|| PathBuf::from("tokei"))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (stowage.toml)
/// 2. Global config (~/.stowage/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global stowage config directory (~/.stowage).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stowage"))
}

/// Get the global config path (~/.stowage/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (stowage.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_FILE)
}
