//! Registry downloads.
//!
//! Archives come from the registry's download endpoint:
//!
//! ```text
//! {registry}/api/v1/crates/{name}/{version}/download
//! ```
//!
//! The URL is a pure function of the registry base, name and version.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use url::Url;

use crate::core::ManifestEntry;
use crate::sources::archive::extract_archive;
use crate::sources::fetcher::{ArchiveFetcher, FetchError};
use crate::util::hash::sha256_bytes;

/// Derive the download URL for `name` at `version`.
pub fn download_url(registry: &str, name: &str, version: &str) -> Result<Url, FetchError> {
    let invalid = |message: String| FetchError::InvalidRegistry {
        registry: registry.to_string(),
        message,
    };

    let mut url = Url::parse(registry).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["api", "v1", "crates", name, version, "download"]);

    Ok(url)
}

/// A successfully fetched and extracted package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArchive {
    /// Where the archive was downloaded from
    pub url: Url,
    /// The extracted `{name}-{version}` directory
    pub path: PathBuf,
    /// SHA256 of the downloaded archive, recorded for auditing
    pub sha256: String,
    /// Archive size in bytes
    pub size: usize,
}

/// Download an entry's archive and extract it into `sources_dir`.
///
/// The archive is written to `sources_dir/{name}-{version}.crate`,
/// unpacked next to it, and removed once extraction succeeds. On failure
/// whatever was written stays on disk.
pub fn fetch_package(
    fetcher: &dyn ArchiveFetcher,
    registry: &str,
    entry: &ManifestEntry,
    sources_dir: &Path,
) -> Result<FetchedArchive, FetchError> {
    let url = download_url(registry, entry.name(), entry.version())?;
    tracing::debug!("Fetching {} from {}", entry, url);

    let bytes = fetcher.fetch(&url)?;
    let sha256 = sha256_bytes(&bytes);

    let archive_path = sources_dir.join(format!("{}.crate", entry.crate_dir()));
    write_archive(&archive_path, sources_dir, &bytes)?;

    let file = File::open(&archive_path).map_err(|source| FetchError::Io {
        path: archive_path.clone(),
        source,
    })?;
    extract_archive(file, sources_dir).map_err(|e| FetchError::Extract {
        archive: archive_path.clone(),
        message: format!("{:#}", e),
    })?;

    std::fs::remove_file(&archive_path).map_err(|source| FetchError::Io {
        path: archive_path.clone(),
        source,
    })?;

    let path = sources_dir.join(entry.crate_dir());
    if !path.is_dir() {
        return Err(FetchError::MissingDirectory { expected: path });
    }

    tracing::debug!("Extracted {} ({} bytes, sha256 {})", path.display(), bytes.len(), sha256);

    Ok(FetchedArchive {
        url,
        path,
        sha256,
        size: bytes.len(),
    })
}

/// Write the archive through a temp file so a partial download never
/// sits at the final name.
fn write_archive(path: &Path, dir: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let io_err = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
