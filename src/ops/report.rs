//! Line-count reports over a vendored source tree.
//!
//! For every top-level unit (a vendored package directory, or a standard
//! library crate) this writes:
//!
//! - `{unit}_tokei_log.log`: one `Module` section per directory and one
//!   `File` section per file with the counter's output,
//! - `{unit}_summary_tokei_log.log`: the counter run over the whole unit,
//!
//! Crates taken from a manifest get a single whole-crate run instead,
//! written to `{name}-{version}_tokei_log.log`.
//!
//! A single `summary.log` for the whole report is written even when
//! there is nothing to count. A missing counter tool is
//! recorded in the logs rather than aborting the report.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use walkdir::WalkDir;

use crate::util::fs::{ensure_dir, write_string};
use crate::util::process::{find_executable, ProcessBuilder};

/// Standard library crates reported by `--std`.
pub const STD_UNITS: [&str; 4] = ["core", "alloc", "proc_macro", "std"];

/// Name of the report-wide summary file.
pub const SUMMARY_FILE: &str = "summary.log";

/// Error running the line counter.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("`{tool}` not found; ensure it is installed and in your PATH")]
    ToolNotFound { tool: String },

    #[error("failed to run `{tool}`: {message}")]
    Spawn { tool: String, message: String },
}

/// Raw output of one counter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// The external line-counting tool, behind a trait so tests can swap it.
pub trait LineCounter {
    /// Count lines under `path` (a file or a directory).
    fn count_lines(&self, path: &Path) -> Result<LineReport, ReportError>;
}

/// `tokei` via a spawned process.
#[derive(Debug, Clone)]
pub struct Tokei {
    program: PathBuf,
}

impl Tokei {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Tokei {
            program: program.into(),
        }
    }
}

impl Default for Tokei {
    fn default() -> Self {
        Tokei::new("tokei")
    }
}

impl LineCounter for Tokei {
    fn count_lines(&self, path: &Path) -> Result<LineReport, ReportError> {
        let tool = self.program.display().to_string();
        let program = find_executable(&self.program)
            .ok_or_else(|| ReportError::ToolNotFound { tool: tool.clone() })?;

        let pb = ProcessBuilder::new(program).arg(path);
        let output = pb.exec().map_err(|e| ReportError::Spawn {
            tool,
            message: format!("{:#}", e),
        })?;

        Ok(LineReport {
            command: pb.display_command(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Which units to report on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Units {
    /// Every top-level directory of the source directory
    Discover,
    /// An explicit list of unit names
    Named(Vec<String>),
    /// `{name}-{version}` crate directories, one whole-crate run each
    Crates(Vec<String>),
}

/// Options for a report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub log_dir: PathBuf,
    pub src_dir: PathBuf,
    pub units: Units,
}

/// Result for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub name: String,
    pub files: usize,
    pub errors: usize,
}

/// Result of a report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub units: Vec<UnitReport>,
    pub summary_path: PathBuf,
    /// Set when the counter tool could not be found.
    pub tool_missing: bool,
}

/// Produce line-count logs for `opts.src_dir` into `opts.log_dir`.
pub fn report(counter: &dyn LineCounter, opts: &ReportOptions) -> Result<ReportSummary> {
    ensure_dir(&opts.log_dir)?;
    tracing::info!("Source directory is {}", opts.src_dir.display());

    let (names, whole_crate) = match &opts.units {
        Units::Named(names) => (names.clone(), false),
        Units::Crates(names) => (names.clone(), true),
        Units::Discover => (discover_units(&opts.src_dir)?, false),
    };

    let mut units = Vec::with_capacity(names.len());
    let mut tool_missing = false;
    for name in &names {
        let unit = if whole_crate {
            report_crate(counter, opts, name, &mut tool_missing)?
        } else {
            report_unit(counter, opts, name, &mut tool_missing)?
        };
        units.push(unit);
    }

    if tool_missing {
        tracing::warn!("line counter not found; see logs in {}", opts.log_dir.display());
    }

    let summary_path = opts.log_dir.join(SUMMARY_FILE);
    let mut summary = header();
    let _ = writeln!(summary, "Source directory: {}", opts.src_dir.display());
    let _ = writeln!(summary, "Units: {}\n", units.len());
    for unit in &units {
        let _ = writeln!(
            summary,
            "{}: {} files, {} errors",
            unit.name, unit.files, unit.errors
        );
    }
    write_string(&summary_path, &summary)?;

    Ok(ReportSummary {
        units,
        summary_path,
        tool_missing,
    })
}

/// Sorted names of the top-level directories of `src_dir`.
pub fn discover_units(src_dir: &Path) -> Result<Vec<String>> {
    if !src_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(src_dir)
        .with_context(|| format!("failed to read directory: {}", src_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn report_unit(
    counter: &dyn LineCounter,
    opts: &ReportOptions,
    name: &str,
    tool_missing: &mut bool,
) -> Result<UnitReport> {
    let root = opts.src_dir.join(name);
    let mut unit = UnitReport {
        name: name.to_string(),
        files: 0,
        errors: 0,
    };

    let mut detail = header();
    if root.is_dir() {
        // Files before subdirectories so each file lands under its own module
        let walker = WalkDir::new(&root)
            .sort_by(|a, b| {
                (a.file_type().is_dir(), a.file_name()).cmp(&(b.file_type().is_dir(), b.file_name()))
            });

        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if entry.file_type().is_dir() {
                let _ = writeln!(detail, "\n***************************\n");
                let _ = writeln!(detail, "Module {}:", module_path(name, &root, entry.path()));
            } else {
                unit.files += 1;
                let _ = writeln!(detail, "\nFile {}:", entry.file_name().to_string_lossy());
                match counter.count_lines(entry.path()) {
                    Ok(report) => {
                        detail.push_str(&report.stdout);
                        if !report.stderr.is_empty() {
                            let _ = write!(detail, "\n--- Standard Error ---\n{}", report.stderr);
                        }
                    }
                    Err(e) => {
                        unit.errors += 1;
                        *tool_missing |= matches!(e, ReportError::ToolNotFound { .. });
                        let _ = writeln!(detail, "Error: {}", e);
                    }
                }
            }
        }
    } else {
        unit.errors += 1;
        let _ = writeln!(detail, "Unit directory not found: {}", root.display());
    }
    write_string(
        &opts.log_dir.join(format!("{}_tokei_log.log", name)),
        &detail,
    )?;

    let mut summary = header();
    record_run(&mut summary, counter.count_lines(&root), &mut unit, tool_missing);
    write_string(
        &opts.log_dir.join(format!("{}_summary_tokei_log.log", name)),
        &summary,
    )?;

    tracing::info!("Line counts for {} saved to {}", name, opts.log_dir.display());

    Ok(unit)
}

/// One counter run over a whole crate, logged the way a per-crate run is
/// read back: command, labelled output, return code.
fn report_crate(
    counter: &dyn LineCounter,
    opts: &ReportOptions,
    name: &str,
    tool_missing: &mut bool,
) -> Result<UnitReport> {
    let root = opts.src_dir.join(name);
    let mut unit = UnitReport {
        name: name.to_string(),
        files: 0,
        errors: 0,
    };

    let mut log = header();
    if root.is_dir() {
        unit.files = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        record_run(&mut log, counter.count_lines(&root), &mut unit, tool_missing);
    } else {
        unit.errors += 1;
        let _ = writeln!(log, "Unit directory not found: {}", root.display());
    }

    let path = opts.log_dir.join(format!("{}_tokei_log.log", name));
    write_string(&path, &log)?;
    tracing::info!("Line counts for {} saved to {}", name, path.display());

    Ok(unit)
}

fn record_run(
    out: &mut String,
    result: Result<LineReport, ReportError>,
    unit: &mut UnitReport,
    tool_missing: &mut bool,
) {
    match result {
        Ok(report) => {
            let _ = writeln!(out, "Command: {}\n", report.command);
            if !report.stdout.is_empty() {
                let _ = write!(out, "--- Standard Output ---\n{}", report.stdout);
            }
            if !report.stderr.is_empty() {
                let _ = write!(out, "\n--- Standard Error ---\n{}", report.stderr);
            }
            let code = report
                .exit_code
                .map_or_else(|| "none".to_string(), |c| c.to_string());
            let _ = writeln!(out, "\nReturn Code: {}", code);
        }
        Err(e) => {
            unit.errors += 1;
            *tool_missing |= matches!(e, ReportError::ToolNotFound { .. });
            let _ = writeln!(out, "Error: {}", e);
        }
    }
}

fn module_path(unit: &str, root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => unit.to_string(),
        Ok(rel) => format!("{}/{}", unit, rel.display()),
        Err(_) => dir.display().to_string(),
    }
}

fn header() -> String {
    format!("Timestamp: {}\n", chrono::Local::now().to_rfc3339())
}
