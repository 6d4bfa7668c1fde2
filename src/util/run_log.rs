//! Append-only run log.
//!
//! One text stream per run, opened in append mode so earlier runs are
//! kept. Every fetch and vendor step writes a record here whether it
//! succeeded or not; the file is the audit trail of the run. Records are
//! also mirrored to `tracing`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::util::process::CommandOutcome;

/// Process-wide run log sink.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
    progress: Option<ProgressBar>,
}

impl RunLog {
    /// Open (or create) the log at `path` in append mode.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open run log: {}", path.display()))?;

        Ok(RunLog {
            path: path.to_path_buf(),
            file,
            progress: None,
        })
    }

    /// Hide `bar` while mirroring records to `tracing`, so the two never
    /// share a terminal line.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the run header.
    pub fn begin_run(&mut self, entries: usize) -> Result<()> {
        let now = chrono::Local::now().to_rfc3339();
        self.write(&format!(
            "=== stowage run started {} ({} manifest entries) ===\n",
            now, entries
        ))
    }

    /// Write the run footer.
    pub fn end_run(&mut self, failures: usize) -> Result<()> {
        let now = chrono::Local::now().to_rfc3339();
        self.write(&format!(
            "=== stowage run finished {} ({} failed steps) ===\n\n",
            now, failures
        ))
    }

    /// Record a progress line.
    pub fn note(&mut self, message: &str) -> Result<()> {
        self.trace(|| tracing::info!("{}", message));
        self.write(&format!("{}\n", message))
    }

    /// Record a captured failure.
    pub fn error(&mut self, message: &str) -> Result<()> {
        self.trace(|| tracing::warn!("{}", message));
        self.write(&format!("Error occurred: {}\n", message))
    }

    /// Record the full result of an external command, successful or not.
    pub fn command(&mut self, label: &str, outcome: &CommandOutcome) -> Result<()> {
        self.trace(|| {
            if outcome.success {
                tracing::debug!("`{}` succeeded", outcome.command);
            } else {
                tracing::warn!("`{}` failed ({})", outcome.command, outcome.status_line());
            }
        });

        let mut record = format!("Vendor logs for {}\n$ {}\n", label, outcome.command);
        record.push_str(&outcome.output);
        if !outcome.output.is_empty() && !outcome.output.ends_with('\n') {
            record.push('\n');
        }
        record.push_str(&format!("[{}]\n\n", outcome.status_line()));
        self.write(&record)
    }

    fn trace(&self, emit: impl FnOnce()) {
        match &self.progress {
            Some(bar) => bar.suspend(emit),
            None => emit(),
        }
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.file
            .write_all(text.as_bytes())
            .and_then(|()| self.file.flush())
            .with_context(|| format!("failed to write run log: {}", self.path.display()))
    }
}
