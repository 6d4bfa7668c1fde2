//! Command implementations

pub mod completions;
pub mod report;
pub mod vendor;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stowage::util::config::{global_config_path, load_config, project_config_path};
use stowage::util::Config;

/// Load global and project configuration for the current directory.
pub fn load_cwd_config() -> Result<(PathBuf, Config)> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let global = global_config_path();
    let config = load_config(global.as_deref(), &project_config_path(&cwd));
    Ok((cwd, config))
}

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
