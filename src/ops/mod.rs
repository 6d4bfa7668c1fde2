//! High-level operations.
//!
//! This module contains the implementation of Stowage commands.

pub mod aggregate;
pub mod pipeline;
pub mod report;
pub mod vendor;

pub use aggregate::{pins_for, synthesize, write_pins, Pin, PinConflict};
pub use pipeline::{EntryReport, RunSummary, StepStatus, VendorRun};
pub use report::{report, LineCounter, LineReport, ReportError, ReportOptions, Tokei, Units};
pub use vendor::{vendor_package, CargoVendor, VendorError, VendorOptions, VendorOutcome, VendorTool};
