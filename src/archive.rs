//! Version-control backend boundary.
//!
//! The pipeline only sees opaque archive bytes. [`GitCli`] produces them as
//! git bundles by shelling out to the `git` executable.

use crate::error::{GitPdfError, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Where the repository to embed comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    Local(PathBuf),
    Remote(String),
}

impl RepoSource {
    pub fn parse(source: &str) -> Self {
        if is_remote(source) {
            Self::Remote(source.to_string())
        } else {
            Self::Local(PathBuf::from(source))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl std::fmt::Display for RepoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// A source is remote iff it starts with `http://`, `https://`, or is an
/// SSH-style `user@host:` reference
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://") || is_scp_like(source)
}

fn is_scp_like(source: &str) -> bool {
    let Some((user, rest)) = source.split_once('@') else {
        return false;
    };
    let Some((host, _)) = rest.split_once(':') else {
        return false;
    };
    !user.is_empty()
        && !user.contains(|c: char| c == '/' || c == ':')
        && !host.is_empty()
        && !host.contains('/')
}

/// Produces and restores self-contained repository archives
///
/// `scratch` is an empty directory owned by the caller; implementations may
/// fill it freely and must not remove it.
pub trait VersionControlBackend {
    fn create_archive(&self, source: &RepoSource, scratch: &Path) -> Result<Vec<u8>>;

    /// Verify `archive` and reconstruct a working repository at `destination`
    /// Verification failures surface as `InvalidArchive`
    fn restore_archive(&self, archive: &[u8], destination: &Path, scratch: &Path) -> Result<()>;
}

/// Backend driving the `git` command-line tool
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable instead of the one on `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run git with the given arguments, returning stdout on success
    fn git(&self, args: &[&OsStr]) -> Result<String> {
        let rendered = render_command(&self.program, args);
        debug!(command = %rendered, "running git");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => GitPdfError::BackendUnavailable(format!(
                    "`{}` not found; install git or put it on PATH",
                    self.program.display()
                )),
                _ => GitPdfError::Io(e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stdout.is_empty() {
            debug!(command = %rendered, "stdout: {}", stdout.trim_end());
        }
        if !stderr.is_empty() {
            debug!(command = %rendered, "stderr: {}", stderr.trim_end());
        }

        if !output.status.success() {
            return Err(GitPdfError::BackendFailed {
                command: rendered,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }
}

impl VersionControlBackend for GitCli {
    fn create_archive(&self, source: &RepoSource, scratch: &Path) -> Result<Vec<u8>> {
        let repo = match source {
            RepoSource::Remote(url) => {
                let clone = scratch.join("clone.git");
                info!(url = %url, "cloning remote repository");
                self.git(&[
                    OsStr::new("clone"),
                    OsStr::new("--bare"),
                    OsStr::new(url),
                    clone.as_os_str(),
                ])?;
                clone
            }
            RepoSource::Local(path) => {
                if !path.is_dir() {
                    return Err(GitPdfError::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("repository {} does not exist", path.display()),
                    )));
                }
                path.clone()
            }
        };

        let bundle = scratch.join("repo.bundle");
        self.git(&[
            OsStr::new("-C"),
            repo.as_os_str(),
            OsStr::new("bundle"),
            OsStr::new("create"),
            bundle.as_os_str(),
            OsStr::new("--all"),
        ])?;

        let data = fs::read(&bundle)?;
        if data.is_empty() {
            return Err(GitPdfError::InvalidArchive("git produced an empty bundle".into()));
        }
        debug!(bytes = data.len(), "bundle created");
        Ok(data)
    }

    fn restore_archive(&self, archive: &[u8], destination: &Path, scratch: &Path) -> Result<()> {
        let bundle = scratch.join("incoming.bundle");
        fs::write(&bundle, archive)?;

        // Older git refuses `bundle verify` outside a repository
        let verifier = scratch.join("verify.git");
        self.git(&[
            OsStr::new("init"),
            OsStr::new("--quiet"),
            OsStr::new("--bare"),
            verifier.as_os_str(),
        ])?;
        self.git(&[
            OsStr::new("-C"),
            verifier.as_os_str(),
            OsStr::new("bundle"),
            OsStr::new("verify"),
            bundle.as_os_str(),
        ])
        .map_err(|e| match e {
            GitPdfError::BackendFailed { stderr, .. } => GitPdfError::InvalidArchive(stderr),
            other => other,
        })?;

        info!(destination = %destination.display(), "cloning repository from bundle");
        self.git(&[
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            bundle.as_os_str(),
            destination.as_os_str(),
        ])?;
        Ok(())
    }
}

fn render_command(program: &Path, args: &[&OsStr]) -> String {
    let mut parts: Vec<OsString> = vec![program.as_os_str().to_os_string()];
    parts.extend(args.iter().map(|a| a.to_os_string()));
    parts
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
