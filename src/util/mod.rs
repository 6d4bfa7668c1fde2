//! Shared utilities

pub mod config;
pub mod fs;
pub mod hash;
pub mod process;
pub mod run_log;

pub use config::Config;
pub use process::{CommandOutcome, ProcessBuilder};
pub use run_log::RunLog;
