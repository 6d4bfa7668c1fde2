//! Aggregate-closure synthesis.
//!
//! Vendoring each package on its own only captures that package's
//! dependency subtree. Resolving all manifest packages together can
//! require extra shared dependencies, or versions none of them would pull
//! alone. To capture the true union, a throwaway project at `sources/tmp`
//! declares every manifest entry as an exact-pinned direct dependency:
//!
//! ```toml
//! [dependencies]
//! foo = "=1.2.3"
//! ```
//!
//! and is vendored into the same shared tree. The `=` keeps the resolver
//! from substituting a compatible patch release.
//!
//! The project directory is recreated on every run, so pins never pile up
//! across runs.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use toml_edit::{value, DocumentMut, Item, Table};

use crate::core::{ManifestEntry, WorkspaceLayout};
use crate::ops::pipeline::StepStatus;
use crate::ops::vendor::{vendor_package, VendorError, VendorOptions, VendorTool};
use crate::util::fs::{ensure_dir, read_to_string, remove_dir_all_if_exists, write_string};
use crate::util::RunLog;

/// Label used for the aggregate project in the run log.
pub const AGGREGATE_LABEL: &str = "tmp";

/// An exact-version dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub name: String,
    pub version: String,
}

impl Pin {
    /// The version requirement, `=version`.
    pub fn requirement(&self) -> String {
        format!("={}", self.version)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.name, self.requirement())
    }
}

/// A manifest name that appeared with more than one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinConflict {
    pub name: String,
    pub replaced: String,
    pub kept: String,
}

/// Turn manifest rows into pins, one per distinct package name.
///
/// Identical rows collapse. When a name repeats with a different version
/// the later row wins and the conflict is reported. Pins keep the order
/// in which names first appear.
pub fn pins_for(entries: &[ManifestEntry]) -> (Vec<Pin>, Vec<PinConflict>) {
    let mut pins: Vec<Pin> = Vec::new();
    let mut conflicts = Vec::new();

    for entry in entries {
        match pins.iter_mut().find(|p| p.name == entry.name()) {
            Some(pin) if pin.version == entry.version() => {}
            Some(pin) => {
                conflicts.push(PinConflict {
                    name: pin.name.clone(),
                    replaced: pin.version.clone(),
                    kept: entry.version().to_string(),
                });
                pin.version = entry.version().to_string();
            }
            None => pins.push(Pin {
                name: entry.name().to_string(),
                version: entry.version().to_string(),
            }),
        }
    }

    (pins, conflicts)
}

/// Replace the `[dependencies]` table of the manifest at `manifest_path`
/// with the given pins.
pub fn write_pins(manifest_path: &Path, pins: &[Pin]) -> Result<()> {
    let content = read_to_string(manifest_path)?;
    let mut doc: DocumentMut = content.parse().map_err(|e| {
        anyhow::anyhow!("failed to parse {}: {}", manifest_path.display(), e)
    })?;

    let mut deps = Table::new();
    for pin in pins {
        deps.insert(&pin.name, value(pin.requirement()));
    }
    doc["dependencies"] = Item::Table(deps);

    write_string(manifest_path, &doc.to_string())
}

/// Build the aggregate project and vendor it into the shared tree.
///
/// Every failure is logged and reported through the returned status;
/// nothing done by earlier phases is rolled back. Only a failure to write
/// the run log is returned as `Err`.
pub fn synthesize(
    tool: &dyn VendorTool,
    layout: &WorkspaceLayout,
    entries: &[ManifestEntry],
    opts: &VendorOptions,
    log: &mut RunLog,
) -> Result<StepStatus> {
    let project_dir = layout.aggregate_dir();
    tracing::info!(
        "Synthesizing aggregate project for {} packages at {}",
        entries.len(),
        project_dir.display()
    );

    if let Err(e) = remove_dir_all_if_exists(&project_dir).and_then(|()| ensure_dir(&project_dir))
    {
        let err = VendorError::Aggregate {
            message: format!("{:#}", e),
        };
        log.error(&err.to_string())?;
        return Ok(StepStatus::failed(&err));
    }

    log.note(&format!("Running cargo init for {}", AGGREGATE_LABEL))?;
    let init = tool.init_project(&project_dir);
    log.command(AGGREGATE_LABEL, &init)?;
    if !init.success {
        let err = VendorError::Failed {
            target: AGGREGATE_LABEL.to_string(),
            command: init.command.clone(),
            status: init.status_line(),
        };
        log.error(&err.to_string())?;
        return Ok(StepStatus::failed(&err));
    }

    let manifest_path = project_dir.join("Cargo.toml");
    let (pins, conflicts) = pins_for(entries);
    for conflict in &conflicts {
        let message = format!(
            "`{}` is listed with versions {} and {}; pinning {}",
            conflict.name, conflict.replaced, conflict.kept, conflict.kept
        );
        tracing::warn!("{}", message);
        log.note(&format!("warning: {}", message))?;
    }

    if let Err(e) = write_pins(&manifest_path, &pins) {
        let err = VendorError::Aggregate {
            message: format!("{:#}", e),
        };
        log.error(&err.to_string())?;
        return Ok(StepStatus::failed(&err));
    }
    for pin in &pins {
        log.note(&format!("Pinned {}", pin))?;
    }

    let outcome = vendor_package(
        tool,
        AGGREGATE_LABEL,
        &project_dir,
        layout.vendor(),
        opts,
        log,
    )?;

    Ok(match outcome.check() {
        Ok(()) => StepStatus::Ok,
        Err(e) => StepStatus::failed(&e),
    })
}
