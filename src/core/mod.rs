//! Core data structures for Stowage.
//!
//! - Manifest entries (the pinned `name`/`version` pairs to vendor)
//! - The on-disk workspace layout a run writes into

pub mod layout;
pub mod manifest;

pub use layout::WorkspaceLayout;
pub use manifest::{load_manifest, ManifestEntry, ManifestError};
