//! Workspace layout - the directories a vendoring run writes into.
//!
//! ```text
//! vendored_project/
//! ├── sources/
//! │   ├── {name}-{version}/   # one extracted archive per manifest entry
//! │   └── tmp/                # synthetic aggregate project
//! ├── src/                    # shared vendor tree (cargo vendor output)
//! └── vendor_logs.txt         # run log
//! ```
//!
//! The vendor tree is additive-only: nothing here ever removes it or any
//! of its subdirectories.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::ManifestEntry;
use crate::util::fs::ensure_dir;

/// Default root directory name, relative to the invoking directory.
pub const DEFAULT_ROOT: &str = "vendored_project";

/// Per-package extraction area.
pub const SOURCES_DIR: &str = "sources";

/// Shared vendor output tree.
pub const VENDOR_DIR: &str = "src";

/// Synthetic aggregate project, inside the sources directory.
pub const AGGREGATE_DIR: &str = "tmp";

/// Run log file name.
pub const LOG_FILE: &str = "vendor_logs.txt";

/// Directory roots used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
    sources: PathBuf,
    vendor: PathBuf,
    log_file: PathBuf,
}

impl WorkspaceLayout {
    /// Describe the layout under `root`. Nothing is created yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        WorkspaceLayout {
            sources: root.join(SOURCES_DIR),
            vendor: root.join(VENDOR_DIR),
            log_file: root.join(LOG_FILE),
            root,
        }
    }

    /// Create the root, sources and vendor directories if they are missing.
    ///
    /// Existing directories are reused as-is so repeated runs accumulate
    /// into the same vendor tree.
    pub fn create(&self) -> Result<()> {
        ensure_dir(&self.root)?;
        ensure_dir(&self.sources)?;
        ensure_dir(&self.vendor)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sources(&self) -> &Path {
        &self.sources
    }

    /// The shared vendor output tree.
    pub fn vendor(&self) -> &Path {
        &self.vendor
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Extraction directory for an entry: `sources/{name}-{version}`.
    pub fn package_dir(&self, entry: &ManifestEntry) -> PathBuf {
        self.sources.join(entry.crate_dir())
    }

    /// Synthetic aggregate project directory: `sources/tmp`.
    pub fn aggregate_dir(&self) -> PathBuf {
        self.sources.join(AGGREGATE_DIR)
    }
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        WorkspaceLayout::new(DEFAULT_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = WorkspaceLayout::new("/work/vendored_project");
        let entry = ManifestEntry::new("foo", "1.2.3");

        assert_eq!(
            layout.package_dir(&entry),
            Path::new("/work/vendored_project/sources/foo-1.2.3")
        );
        assert_eq!(
            layout.aggregate_dir(),
            Path::new("/work/vendored_project/sources/tmp")
        );
        assert_eq!(layout.vendor(), Path::new("/work/vendored_project/src"));
        assert_eq!(
            layout.log_file(),
            Path::new("/work/vendored_project/vendor_logs.txt")
        );
    }

    #[test]
    fn test_create_keeps_existing_vendor_tree() {
        let tmp = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(tmp.path().join("vp"));
        layout.create().unwrap();

        let vendored = layout.vendor().join("libc-0.2.177");
        std::fs::create_dir_all(&vendored).unwrap();
        std::fs::write(vendored.join("Cargo.toml"), "[package]").unwrap();

        layout.create().unwrap();

        assert!(layout.sources().is_dir());
        assert!(vendored.join("Cargo.toml").exists());
    }
}
