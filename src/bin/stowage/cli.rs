//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Stowage - vendor a pinned set of crates.io packages for offline builds
#[derive(Parser)]
#[command(name = "stowage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, extract and vendor every package in a manifest
    Vendor(VendorArgs),

    /// Write line-count reports for a vendored source tree
    Report(ReportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct VendorArgs {
    /// CSV manifest with `name` and `version` columns
    #[arg(long, default_value = "crates_list.csv")]
    pub manifest: PathBuf,

    /// Output root (defaults to `vendored_project`)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Registry base URL
    #[arg(long, env = "STOWAGE_REGISTRY")]
    pub registry: Option<String>,

    /// Path to cargo
    #[arg(long, env = "STOWAGE_CARGO")]
    pub cargo: Option<PathBuf>,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Exit non-zero if any step failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Directory to write the logs into
    #[arg(long)]
    pub log_dir: PathBuf,

    /// Source tree to count (e.g. a vendor tree, or `library/` of a Rust checkout)
    #[arg(long)]
    pub src_dir: PathBuf,

    /// Report only these top-level units
    #[arg(long = "unit", conflicts_with_all = ["manifest", "std"])]
    pub units: Vec<String>,

    /// Report the `{name}-{version}` units listed in a manifest
    #[arg(long, conflicts_with = "std")]
    pub manifest: Option<PathBuf>,

    /// Report the standard library crates (core, alloc, proc_macro, std)
    #[arg(long)]
    pub std: bool,

    /// Path to the line-count tool
    #[arg(long)]
    pub tool: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
