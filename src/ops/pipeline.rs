//! The vendoring run.
//!
//! Entries are processed one at a time in manifest order: fetch and
//! extract, then vendor into the shared tree. After the last entry the
//! aggregate project is synthesized and vendored once. A failing step is
//! logged and the run moves on; the summary reports what failed.

use anyhow::Result;
use indicatif::ProgressBar;
use serde::Serialize;

use crate::core::{ManifestEntry, WorkspaceLayout};
use crate::ops::aggregate;
use crate::ops::vendor::{vendor_package, VendorOptions, VendorTool};
use crate::sources::{fetch_package, ArchiveFetcher};
use crate::util::RunLog;

/// Outcome of one step of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed { message: String },
    Skipped { reason: String },
}

impl StepStatus {
    pub fn failed(err: &dyn std::fmt::Display) -> Self {
        StepStatus::Failed {
            message: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StepStatus::Ok)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }
}

/// Per-entry result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    #[serde(flatten)]
    pub entry: ManifestEntry,
    pub fetch: StepStatus,
    pub vendor: StepStatus,
}

/// Result of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub entries: Vec<EntryReport>,
    pub aggregate: StepStatus,
}

impl RunSummary {
    /// Number of failed steps across all phases.
    pub fn failures(&self) -> usize {
        let entry_failures: usize = self
            .entries
            .iter()
            .map(|e| usize::from(e.fetch.is_failed()) + usize::from(e.vendor.is_failed()))
            .sum();
        entry_failures + usize::from(self.aggregate.is_failed())
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Entries with at least one failed step.
    pub fn failed_entries(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| e.fetch.is_failed() || e.vendor.is_failed())
    }
}

/// A configured vendoring run.
pub struct VendorRun<'a> {
    layout: WorkspaceLayout,
    registry: String,
    fetcher: &'a dyn ArchiveFetcher,
    tool: &'a dyn VendorTool,
    options: VendorOptions,
    progress: Option<ProgressBar>,
}

impl<'a> VendorRun<'a> {
    pub fn new(
        layout: WorkspaceLayout,
        registry: impl Into<String>,
        fetcher: &'a dyn ArchiveFetcher,
        tool: &'a dyn VendorTool,
    ) -> Self {
        VendorRun {
            layout,
            registry: registry.into(),
            fetcher,
            tool,
            options: VendorOptions::default(),
            progress: None,
        }
    }

    /// Report per-entry progress on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Run the pipeline over `entries`.
    ///
    /// Only layout or run log I/O failures are returned as `Err`; every
    /// fetch and vendor failure is captured in the summary and the log.
    pub fn run(&self, entries: &[ManifestEntry]) -> Result<RunSummary> {
        self.layout.create()?;
        let mut log = RunLog::open(self.layout.log_file())?;
        if let Some(bar) = &self.progress {
            log = log.with_progress(bar.clone());
        }
        log.begin_run(entries.len())?;

        tracing::info!(
            "Vendoring {} packages into {}",
            entries.len(),
            self.layout.vendor().display()
        );

        let mut reports = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(bar) = &self.progress {
                bar.set_message(entry.to_string());
            }

            reports.push(self.process_entry(entry, &mut log)?);

            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        let aggregate =
            aggregate::synthesize(self.tool, &self.layout, entries, &self.options, &mut log)?;

        let summary = RunSummary {
            entries: reports,
            aggregate,
        };
        log.end_run(summary.failures())?;

        Ok(summary)
    }

    fn process_entry(&self, entry: &ManifestEntry, log: &mut RunLog) -> Result<EntryReport> {
        if !entry.is_exact_version() {
            log.note(&format!(
                "warning: `{}` is not an exact version for {}; the download will likely fail",
                entry.version(),
                entry.name()
            ))?;
        }

        let fetch = match fetch_package(self.fetcher, &self.registry, entry, self.layout.sources())
        {
            Ok(fetched) => {
                log.note(&format!(
                    "Fetched {} from {} ({} bytes, sha256 {})",
                    entry, fetched.url, fetched.size, fetched.sha256
                ))?;
                StepStatus::Ok
            }
            Err(e) => {
                log.error(&format!("fetching {}: {}", entry, e))?;
                StepStatus::failed(&e)
            }
        };

        let vendor = if fetch.is_ok() {
            let outcome = vendor_package(
                self.tool,
                entry.name(),
                &self.layout.package_dir(entry),
                self.layout.vendor(),
                &self.options,
                log,
            )?;
            match outcome.check() {
                Ok(()) => StepStatus::Ok,
                Err(e) => StepStatus::failed(&e),
            }
        } else {
            log.note(&format!(
                "Skipping cargo vendor command for {}: fetch failed",
                entry.name()
            ))?;
            StepStatus::Skipped {
                reason: "fetch failed".to_string(),
            }
        };

        Ok(EntryReport {
            entry: entry.clone(),
            fetch,
            vendor,
        })
    }
}
