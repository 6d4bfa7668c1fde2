//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};
use serde::Serialize;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        Ok(output)
    }

    /// Execute and fold every result, spawn failures included, into an outcome.
    pub fn outcome(&self) -> CommandOutcome {
        let command = self.display_command();
        tracing::debug!("running `{}`", command);

        match self.exec() {
            Ok(output) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                CommandOutcome {
                    command,
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    output: combined,
                }
            }
            Err(e) => CommandOutcome::spawn_failure(command, &e),
        }
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        let command = parts.join(" ");

        match self.cwd {
            Some(ref cwd) => format!("cd {} && {}", cwd.display(), command),
            None => command,
        }
    }
}

/// Result of running an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    /// Command line as displayed in logs.
    pub command: String,
    /// Whether the process ran and exited zero.
    pub success: bool,
    /// Exit code, if the process ran and was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: String,
}

impl CommandOutcome {
    /// Outcome for a process that could not be started at all.
    pub fn spawn_failure(command: impl Into<String>, err: &anyhow::Error) -> Self {
        CommandOutcome {
            command: command.into(),
            success: false,
            exit_code: None,
            output: format!("{:#}\n", err),
        }
    }

    /// Short human description of the exit status.
    pub fn status_line(&self) -> String {
        match (self.success, self.exit_code) {
            (true, _) => "exit status 0".to_string(),
            (false, Some(code)) => format!("exit status {}", code),
            (false, None) => "did not complete".to_string(),
        }
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: impl AsRef<OsStr>) -> Option<PathBuf> {
    which::which(name).ok()
}
