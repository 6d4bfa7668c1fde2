//! Package sources.
//!
//! Everything needed to turn a manifest entry into an extracted source
//! tree under `sources/`: registry URL derivation, the download
//! capability, and archive extraction.

pub mod archive;
pub mod fetcher;
pub mod registry;

pub use archive::extract_archive;
pub use fetcher::{ArchiveFetcher, FetchError, HttpFetcher};
pub use registry::{download_url, fetch_package, FetchedArchive};
