//! `stowage report` command

use anyhow::Result;

use super::{absolutize, load_cwd_config};
use crate::cli::ReportArgs;
use stowage::core::load_manifest;
use stowage::ops::report::{report, ReportOptions, Tokei, Units, STD_UNITS};

pub fn execute(args: ReportArgs) -> Result<()> {
    let (cwd, config) = load_cwd_config()?;

    let units = if args.std {
        Units::Named(STD_UNITS.iter().map(|u| u.to_string()).collect())
    } else if let Some(manifest) = args.manifest {
        let entries = load_manifest(&absolutize(&cwd, &manifest))?;
        Units::Crates(entries.iter().map(|e| e.crate_dir()).collect())
    } else if !args.units.is_empty() {
        Units::Named(args.units)
    } else {
        Units::Discover
    };

    let tool = Tokei::new(args.tool.unwrap_or_else(|| config.report_tool()));
    let opts = ReportOptions {
        log_dir: absolutize(&cwd, &args.log_dir),
        src_dir: absolutize(&cwd, &args.src_dir),
        units,
    };

    let summary = report(&tool, &opts)?;

    eprintln!(
        "    Finished line counts for {} units, summary saved to {}",
        summary.units.len(),
        summary.summary_path.display()
    );

    Ok(())
}
