//! `stowage vendor` command

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use super::{absolutize, load_cwd_config};
use crate::cli::VendorArgs;
use stowage::core::{load_manifest, WorkspaceLayout};
use stowage::ops::{CargoVendor, VendorRun};
use stowage::sources::HttpFetcher;
use stowage::util::fs::write_string;

/// Printed at the end of every run that is not failed by `--strict`.
const SUCCESS_BANNER: &str = "Cargo vendor logs recorded for all the crates successfully.";

pub fn execute(args: VendorArgs, verbose: bool) -> Result<i32> {
    let (cwd, config) = load_cwd_config()?;

    let manifest_path = absolutize(&cwd, &args.manifest);
    let entries = load_manifest(&manifest_path)?;

    let root = absolutize(&cwd, &args.root.unwrap_or_else(|| config.root()));
    let registry = args
        .registry
        .unwrap_or_else(|| config.registry_url().to_string());
    let cargo = args.cargo.unwrap_or_else(|| config.cargo());

    let fetcher = HttpFetcher::new(
        &config.user_agent(),
        config.registry.timeout_secs.map(Duration::from_secs),
    )?;
    let tool = CargoVendor::new(cargo);

    let layout = WorkspaceLayout::new(root);
    let log_path = layout.log_file().to_path_buf();

    let summary = VendorRun::new(layout, registry, &fetcher, &tool)
        .with_progress(progress_bar(entries.len(), verbose)?)
        .run(&entries)?;

    if let Some(path) = args.summary_json {
        let path = absolutize(&cwd, &path);
        let json = serde_json::to_string_pretty(&summary)
            .context("failed to serialize run summary")?;
        write_string(&path, &json)?;
    }

    if summary.is_success() {
        println!("{}", SUCCESS_BANNER);
        return Ok(0);
    }

    eprintln!(
        "warning: {} step(s) failed; see {}",
        summary.failures(),
        log_path.display()
    );
    if args.strict {
        return Ok(1);
    }
    println!("{}", SUCCESS_BANNER);
    Ok(0)
}

fn progress_bar(len: usize, verbose: bool) -> Result<ProgressBar> {
    if verbose {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .context("invalid progress template")?,
    );
    Ok(bar)
}
