//! Per-package vendoring.
//!
//! Runs `cargo vendor` inside one extracted package, targeting the shared
//! vendor tree in no-delete, versioned-directories mode: earlier vendored
//! packages stay in place and each dependency lands in a
//! `{name}-{version}` directory, so different versions never collide.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::util::process::{CommandOutcome, ProcessBuilder};
use crate::util::RunLog;

/// Package name given to the synthetic aggregate project.
pub const AGGREGATE_PACKAGE_NAME: &str = "stowage-closure";

/// A failed vendoring step, per-package or aggregate.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("`{command}` failed for `{target}` ({status})")]
    Failed {
        target: String,
        command: String,
        status: String,
    },

    #[error("aggregate project could not be prepared: {message}")]
    Aggregate { message: String },
}

/// Flags passed to the vendoring tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorOptions {
    /// Keep previously vendored packages (`--no-delete`)
    pub no_delete: bool,
    /// Store dependencies in version-qualified directories (`--versioned-dirs`)
    pub versioned_dirs: bool,
}

impl Default for VendorOptions {
    fn default() -> Self {
        VendorOptions {
            no_delete: true,
            versioned_dirs: true,
        }
    }
}

impl VendorOptions {
    /// Command-line flags for these options.
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.no_delete {
            flags.push("--no-delete");
        }
        if self.versioned_dirs {
            flags.push("--versioned-dirs");
        }
        flags
    }
}

/// The dependency-vendoring tool, behind a trait so tests can swap it.
pub trait VendorTool {
    /// Initialize a minimal buildable project in `dir`.
    fn init_project(&self, dir: &Path) -> CommandOutcome;

    /// Vendor the dependencies of the project at `project` into `output_root`.
    fn vendor_into(
        &self,
        project: &Path,
        output_root: &Path,
        opts: &VendorOptions,
    ) -> CommandOutcome;
}

/// `cargo vendor` via a spawned cargo process.
#[derive(Debug, Clone)]
pub struct CargoVendor {
    cargo: PathBuf,
}

impl CargoVendor {
    pub fn new(cargo: impl Into<PathBuf>) -> Self {
        CargoVendor {
            cargo: cargo.into(),
        }
    }
}

impl Default for CargoVendor {
    fn default() -> Self {
        CargoVendor::new("cargo")
    }
}

impl VendorTool for CargoVendor {
    fn init_project(&self, dir: &Path) -> CommandOutcome {
        ProcessBuilder::new(&self.cargo)
            .args(["init", "--vcs", "none", "--name", AGGREGATE_PACKAGE_NAME])
            .cwd(dir)
            .outcome()
    }

    fn vendor_into(
        &self,
        project: &Path,
        output_root: &Path,
        opts: &VendorOptions,
    ) -> CommandOutcome {
        // cargo runs inside `project`, so a relative output root would move
        let output_root =
            std::path::absolute(output_root).unwrap_or_else(|_| output_root.to_path_buf());

        ProcessBuilder::new(&self.cargo)
            .arg("vendor")
            .args(opts.flags())
            .arg(&output_root)
            .cwd(project)
            .outcome()
    }
}

/// Result of one vendoring attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorOutcome {
    /// What was vendored (package name, or `tmp` for the aggregate project)
    pub target: String,
    /// The raw tool result
    pub outcome: CommandOutcome,
}

impl VendorOutcome {
    pub fn ok(&self) -> bool {
        self.outcome.success
    }

    /// Combined tool output, whether it succeeded or not.
    pub fn raw_output(&self) -> &str {
        &self.outcome.output
    }

    /// Convert a failed outcome into a [`VendorError`].
    pub fn check(&self) -> Result<(), VendorError> {
        if self.ok() {
            Ok(())
        } else {
            Err(VendorError::Failed {
                target: self.target.clone(),
                command: self.outcome.command.clone(),
                status: self.outcome.status_line(),
            })
        }
    }
}

/// Vendor one extracted package into the shared vendor tree.
///
/// The raw tool output is appended to the run log unconditionally. Only
/// a failure to write the log itself is returned as `Err`.
pub fn vendor_package(
    tool: &dyn VendorTool,
    target: &str,
    package_dir: &Path,
    vendor_root: &Path,
    opts: &VendorOptions,
    log: &mut RunLog,
) -> Result<VendorOutcome> {
    log.note(&format!("Running cargo vendor command for {}", target))?;
    if !opts.no_delete || !opts.versioned_dirs {
        log.note(&format!(
            "warning: vendoring {} without {}; earlier vendored packages may be replaced",
            target,
            VendorOptions::default().flags().join(" ")
        ))?;
    }

    let outcome = tool.vendor_into(package_dir, vendor_root, opts);
    log.command(target, &outcome)?;

    let result = VendorOutcome {
        target: target.to_string(),
        outcome,
    };
    if let Err(e) = result.check() {
        log.error(&e.to_string())?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeVendorTool, ToolCall};
    use tempfile::TempDir;

    #[test]
    fn test_vendor_flags() {
        assert_eq!(
            VendorOptions::default().flags(),
            vec!["--no-delete", "--versioned-dirs"]
        );

        let opts = VendorOptions {
            no_delete: false,
            versioned_dirs: true,
        };
        assert_eq!(opts.flags(), vec!["--versioned-dirs"]);
    }

    #[test]
    fn test_vendor_package_logs_success() {
        let tmp = TempDir::new().unwrap();
        let package_dir = tmp.path().join("sources/foo-1.2.3");
        let vendor_root = tmp.path().join("src");
        std::fs::create_dir_all(&package_dir).unwrap();
        let mut log = RunLog::open(&tmp.path().join("log.txt")).unwrap();

        let tool = FakeVendorTool::new();
        let outcome = vendor_package(
            &tool,
            "foo",
            &package_dir,
            &vendor_root,
            &VendorOptions::default(),
            &mut log,
        )
        .unwrap();

        assert!(outcome.ok());
        assert!(outcome.check().is_ok());
        assert_eq!(
            tool.calls(),
            vec![ToolCall::Vendor {
                project: package_dir.clone(),
                output_root: vendor_root.clone(),
                opts: VendorOptions::default(),
            }]
        );

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("Running cargo vendor command for foo\n"));
        assert!(contents.contains("Vendor logs for foo\n"));
    }

    #[test]
    fn test_vendor_package_logs_failure_output() {
        let tmp = TempDir::new().unwrap();
        let package_dir = tmp.path().join("bar-0.1.0");
        std::fs::create_dir_all(&package_dir).unwrap();
        let mut log = RunLog::open(&tmp.path().join("log.txt")).unwrap();

        let mut tool = FakeVendorTool::new();
        tool.fail_vendor("bar-0.1.0", "error: failed to select a version");

        let outcome = vendor_package(
            &tool,
            "bar",
            &package_dir,
            &tmp.path().join("src"),
            &VendorOptions::default(),
            &mut log,
        )
        .unwrap();

        assert!(!outcome.ok());
        assert!(outcome.raw_output().contains("failed to select a version"));
        assert!(matches!(outcome.check(), Err(VendorError::Failed { .. })));

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("Vendor logs for bar\n"));
        assert!(contents.contains("error: failed to select a version"));
        assert!(contents.contains("Error occurred:"));
    }

    #[test]
    fn test_vendor_package_warns_when_tree_is_not_additive() {
        let tmp = TempDir::new().unwrap();
        let package_dir = tmp.path().join("foo-1.2.3");
        std::fs::create_dir_all(&package_dir).unwrap();
        let mut log = RunLog::open(&tmp.path().join("log.txt")).unwrap();

        let opts = VendorOptions {
            no_delete: false,
            versioned_dirs: true,
        };
        vendor_package(
            &FakeVendorTool::new(),
            "foo",
            &package_dir,
            &tmp.path().join("src"),
            &opts,
            &mut log,
        )
        .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("warning: vendoring foo without --no-delete --versioned-dirs"));
    }

    /// Write a shell script standing in for cargo that prints where and how
    /// it was run.
    #[cfg(unix)]
    fn echo_cargo(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("cargo");
        std::fs::write(&path, "#!/bin/sh\necho \"PWD=$(pwd -P)\"\necho \"ARGS=$*\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_cargo_vendor_runs_inside_package_with_absolute_output() {
        let tmp = TempDir::new().unwrap();
        let package_dir = tmp.path().join("sources/foo-1.2.3");
        std::fs::create_dir_all(&package_dir).unwrap();
        let tool = CargoVendor::new(echo_cargo(tmp.path()));

        let outcome = tool.vendor_into(
            &package_dir,
            Path::new("rel/src"),
            &VendorOptions::default(),
        );

        assert!(outcome.success, "{}", outcome.output);
        let expected_cwd = package_dir.canonicalize().unwrap();
        assert!(outcome
            .output
            .contains(&format!("PWD={}\n", expected_cwd.display())));

        let expected_root = std::env::current_dir().unwrap().join("rel/src");
        assert!(expected_root.is_absolute());
        assert!(outcome.output.contains(&format!(
            "ARGS=vendor --no-delete --versioned-dirs {}\n",
            expected_root.display()
        )));
    }

    #[cfg(unix)]
    #[test]
    fn test_cargo_init_names_aggregate_project() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("sources/tmp");
        std::fs::create_dir_all(&project).unwrap();
        let tool = CargoVendor::new(echo_cargo(tmp.path()));

        let outcome = tool.init_project(&project);

        assert!(outcome.success, "{}", outcome.output);
        assert!(outcome
            .output
            .contains(&format!("PWD={}\n", project.canonicalize().unwrap().display())));
        assert!(outcome
            .output
            .contains("ARGS=init --vcs none --name stowage-closure\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_cargo_vendor_missing_binary_is_captured() {
        let tmp = TempDir::new().unwrap();
        let tool = CargoVendor::new(tmp.path().join("no-such-cargo"));

        let outcome = tool.vendor_into(tmp.path(), &tmp.path().join("src"), &VendorOptions::default());
        assert!(!outcome.success);
        assert!(outcome.command.contains("vendor --no-delete --versioned-dirs"));
    }
}
