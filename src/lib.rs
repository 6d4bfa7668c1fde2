//! Stowage - reproducible vendoring of pinned crates.io packages
//!
//! This crate provides the core library functionality for Stowage:
//! fetching published crate archives, running `cargo vendor` against each
//! of them, and synthesizing an aggregate project so the transitive
//! closure of the whole manifest lands in a single vendor tree.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Fakes for the network and process seams used by unit tests.
#[cfg(test)]
pub mod test_support;

pub use core::{layout::WorkspaceLayout, manifest::ManifestEntry};
pub use ops::{RunSummary, VendorRun};
pub use util::{Config, RunLog};
