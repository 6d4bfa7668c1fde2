//! Manifest loading.
//!
//! A manifest is a CSV file with a header row containing at least the
//! columns `name` and `version`:
//!
//! ```text
//! name,version
//! serde,1.0.228
//! libc,0.2.177
//! ```
//!
//! Row order is preserved and defines processing order. Rows are not
//! deduplicated and versions are not validated here; a bad version
//! surfaces later as a fetch or vendor failure.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns every manifest must carry.
pub const REQUIRED_COLUMNS: [&str; 2] = ["name", "version"];

/// Error reading a manifest. Always fatal for a run.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("manifest {} is missing required column `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("malformed manifest {} at line {line}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

/// A single pinned package to vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
    name: String,
    version: String,
}

impl ManifestEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ManifestEntry {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Package name as published on the registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact version string, passed through as written.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory name a published archive unpacks to: `{name}-{version}`.
    pub fn crate_dir(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Whether the version is a plain semver version (no ranges or operators).
    pub fn is_exact_version(&self) -> bool {
        semver::Version::parse(&self.version).is_ok()
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Load manifest entries from a CSV file, preserving row order.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let malformed = |line: u64, err: &dyn fmt::Display| ManifestError::Malformed {
        path: path.to_path_buf(),
        line,
        message: err.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| malformed(0, &e))?;

    let headers = reader.headers().map_err(|e| malformed(1, &e))?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ManifestError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            malformed(line, &e)
        })?;
        let line = record.position().map_or(0, |p| p.line());
        let entry: ManifestEntry = record
            .deserialize(Some(&headers))
            .map_err(|e| malformed(line, &e))?;
        entries.push(entry);
    }

    tracing::debug!("loaded {} manifest entries from {}", entries.len(), path.display());

    Ok(entries)
}
