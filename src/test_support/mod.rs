//! Test utilities and fakes for Stowage unit tests.
//!
//! The pipeline talks to the network and to external tools only through
//! [`ArchiveFetcher`], [`VendorTool`] and [`LineCounter`]. The fakes here
//! implement those traits in-process and record how they were called.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut fetcher = FakeFetcher::new();
//! fetcher.serve(url, crate_tarball("foo", "1.2.3", &[("Cargo.toml", "")]));
//!
//! let tool = FakeVendorTool::new();
//! let summary = VendorRun::new(layout, "https://crates.io", &fetcher, &tool).run(&entries)?;
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use url::Url;

use crate::ops::report::{LineCounter, LineReport, ReportError};
use crate::ops::vendor::{VendorOptions, VendorTool, AGGREGATE_PACKAGE_NAME};
use crate::sources::{ArchiveFetcher, FetchError};
use crate::util::process::CommandOutcome;

/// Build an in-memory `.crate` archive: a gzip tarball whose entries live
/// under `{name}-{version}/`.
pub fn crate_tarball(name: &str, version: &str, files: &[(&str, &str)]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;

    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = Builder::new(encoder);
        let prefix = format!("{}-{}", name, version);

        let mut header = tar::Header::new_gnu();
        header.set_path(format!("{}/", prefix)).unwrap();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        builder.append(&header, std::io::empty()).unwrap();

        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(format!("{}/{}", prefix, path)).unwrap();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append(&header, std::io::Cursor::new(contents.as_bytes()))
                .unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}

enum FakeResponse {
    Body(Vec<u8>),
    Transport(String),
}

/// Fetcher serving canned responses. Unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, FakeResponse>,
    requests: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn serve(&mut self, url: &str, body: Vec<u8>) -> &mut Self {
        self.responses
            .insert(url.to_string(), FakeResponse::Body(body));
        self
    }

    /// Fail `url` with a transport error, as for an unreachable host.
    pub fn fail_transport(&mut self, url: &str, message: &str) -> &mut Self {
        self.responses
            .insert(url.to_string(), FakeResponse::Transport(message.to_string()));
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArchiveFetcher for FakeFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.to_string());

        match self.responses.get(url.as_str()) {
            Some(FakeResponse::Body(body)) => Ok(body.clone()),
            Some(FakeResponse::Transport(message)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// A recorded call on [`FakeVendorTool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Init {
        dir: PathBuf,
    },
    Vendor {
        project: PathBuf,
        output_root: PathBuf,
        opts: VendorOptions,
    },
}

/// Vendoring tool that touches the filesystem the way cargo would, minus
/// the network.
///
/// `init_project` writes a minimal `Cargo.toml`. A successful
/// `vendor_into` creates `output_root/{project dir name}/` with a
/// checksum file, standing in for the vendored packages.
#[derive(Default)]
pub struct FakeVendorTool {
    calls: RefCell<Vec<ToolCall>>,
    failing_vendor: HashMap<String, String>,
    failing_init: Option<String>,
    skip_manifest: bool,
}

impl FakeVendorTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail vendoring for projects whose directory is named `dir_name`.
    pub fn fail_vendor(&mut self, dir_name: &str, output: &str) -> &mut Self {
        self.failing_vendor
            .insert(dir_name.to_string(), output.to_string());
        self
    }

    /// Fail project initialization with `output`.
    pub fn fail_init(&mut self, output: &str) -> &mut Self {
        self.failing_init = Some(output.to_string());
        self
    }

    /// Report init success without writing a manifest.
    pub fn skip_manifest_on_init(&mut self) -> &mut Self {
        self.skip_manifest = true;
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.borrow().clone()
    }

    /// Project directory names that were vendored successfully.
    pub fn vendored(&self) -> HashSet<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                ToolCall::Vendor { project, .. } => Some(dir_name(project)),
                ToolCall::Init { .. } => None,
            })
            .filter(|name| !self.failing_vendor.contains_key(name))
            .collect()
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn outcome(command: String, success: bool, output: String) -> CommandOutcome {
    CommandOutcome {
        command,
        success,
        exit_code: Some(if success { 0 } else { 101 }),
        output,
    }
}

impl VendorTool for FakeVendorTool {
    fn init_project(&self, dir: &Path) -> CommandOutcome {
        self.calls
            .borrow_mut()
            .push(ToolCall::Init { dir: dir.to_path_buf() });
        let command = format!("fake-cargo init {}", dir.display());

        if let Some(output) = &self.failing_init {
            return outcome(command, false, output.clone());
        }
        if !self.skip_manifest {
            let manifest = format!(
                "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
                AGGREGATE_PACKAGE_NAME
            );
            if let Err(e) = std::fs::write(dir.join("Cargo.toml"), manifest) {
                return outcome(command, false, e.to_string());
            }
        }
        outcome(command, true, "Created binary (application) package\n".to_string())
    }

    fn vendor_into(
        &self,
        project: &Path,
        output_root: &Path,
        opts: &VendorOptions,
    ) -> CommandOutcome {
        self.calls.borrow_mut().push(ToolCall::Vendor {
            project: project.to_path_buf(),
            output_root: output_root.to_path_buf(),
            opts: *opts,
        });
        let name = dir_name(project);
        let command = format!("fake-cargo vendor {} {}", name, output_root.display());

        if let Some(output) = self.failing_vendor.get(&name) {
            return outcome(command, false, output.clone());
        }

        let target = output_root.join(&name);
        let written = std::fs::create_dir_all(&target)
            .and_then(|()| std::fs::write(target.join(".cargo-checksum.json"), "{}"));
        match written {
            Ok(()) => outcome(command, true, format!("Vendoring {}\n", name)),
            Err(e) => outcome(command, false, e.to_string()),
        }
    }
}

/// Line counter that counts newlines in-process.
#[derive(Default)]
pub struct FakeLineCounter {
    missing: bool,
}

impl FakeLineCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter whose tool is not installed.
    pub fn missing() -> Self {
        FakeLineCounter { missing: true }
    }
}

impl LineCounter for FakeLineCounter {
    fn count_lines(&self, path: &Path) -> Result<LineReport, ReportError> {
        if self.missing {
            return Err(ReportError::ToolNotFound {
                tool: "tokei".to_string(),
            });
        }

        let stdout = if path.is_file() {
            let lines = std::fs::read_to_string(path)
                .map(|s| s.lines().count())
                .unwrap_or(0);
            format!("{} lines in {}\n", lines, dir_name(path))
        } else {
            let files = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .count();
            format!("{} files\n", files)
        };

        Ok(LineReport {
            command: format!("fake-count {}", path.display()),
            stdout,
            stderr: String::new(),
            exit_code: Some(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_fetcher_unknown_url_is_404() {
        let fetcher = FakeFetcher::new();
        let url = Url::parse("https://crates.io/api/v1/crates/x/1.0.0/download").unwrap();

        assert!(matches!(
            fetcher.fetch(&url),
            Err(FetchError::Http { status: 404, .. })
        ));
        assert_eq!(fetcher.requests(), vec![url.to_string()]);
    }

    #[test]
    fn test_fake_vendor_tool_records_calls() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut tool = FakeVendorTool::new();
        tool.fail_vendor("bad-1.0.0", "boom");

        let out = tmp.path().join("src");
        assert!(tool
            .vendor_into(&tmp.path().join("good-1.0.0"), &out, &VendorOptions::default())
            .success);
        assert!(!tool
            .vendor_into(&tmp.path().join("bad-1.0.0"), &out, &VendorOptions::default())
            .success);

        assert!(out.join("good-1.0.0/.cargo-checksum.json").exists());
        assert!(!out.join("bad-1.0.0").exists());
        assert_eq!(
            tool.vendored(),
            HashSet::from(["good-1.0.0".to_string()])
        );
    }
}
