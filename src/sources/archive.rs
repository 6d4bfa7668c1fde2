//! Gzip tarball extraction.
//!
//! Published crate archives are `.tar.gz` files whose entries all live
//! under a single `{name}-{version}/` directory, so extracting into the
//! sources directory yields `sources/{name}-{version}/`.

use std::io::Read;
use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

/// Extract a gzip-compressed tarball into `dest`.
///
/// Entries with absolute paths or `..` components are rejected rather
/// than skipped, so a hostile archive fails loudly.
pub fn extract_archive<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(reader));

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive
        .entries()
        .context("failed to read tarball entries")?
    {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry
            .path()
            .context("failed to get entry path")?
            .into_owned();

        if entry_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!(
                "tarball entry escapes destination directory: {}",
                entry_path.display()
            );
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            EntryType::Directory
            | EntryType::Regular
            | EntryType::Continuous
            | EntryType::Symlink
            | EntryType::Link => {
                entry.unpack_in(dest).with_context(|| {
                    format!("failed to extract entry: {}", entry_path.display())
                })?;
            }
            EntryType::XGlobalHeader | EntryType::XHeader => {}
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    Ok(())
}
