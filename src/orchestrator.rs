//! Embed and extract pipelines.
//!
//! ```text
//! embed:   CreateArchive → Encrypt → Compress → WriteContainer
//! extract: ReadContainer → Decompress → Decrypt → RestoreArchive
//! ```
//!
//! Every temporary file or directory is a `tempfile` value owned here, so it
//! is released on success and on every failure path. Outputs are staged next
//! to their final location and renamed into place only when complete.

use crate::algorithm::{CipherSuite, Compression};
use crate::archive::{RepoSource, VersionControlBackend};
use crate::container::{AttachmentPayload, ContainerStore};
use crate::error::{GitPdfError, Result};
use crate::key::SecretKey;
use crate::pipeline::{compress, decompress, decrypt, encrypt};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, info_span};

/// Named pipeline stage, attached to every error raised inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateArchive,
    Encrypt,
    Compress,
    WriteContainer,
    ReadContainer,
    Decompress,
    Decrypt,
    RestoreArchive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateArchive => "create-archive",
            Self::Encrypt => "encrypt",
            Self::Compress => "compress",
            Self::WriteContainer => "write-container",
            Self::ReadContainer => "read-container",
            Self::Decompress => "decompress",
            Self::Decrypt => "decrypt",
            Self::RestoreArchive => "restore-archive",
        };
        f.write_str(name)
    }
}

/// Cipher and compression applied to the archive; must match between embed and extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Codec {
    pub cipher: CipherSuite,
    pub compression: Compression,
}

/// Filename and description recorded for the attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLabel {
    pub filename: String,
    pub description: String,
}

impl Default for AttachmentLabel {
    fn default() -> Self {
        Self {
            filename: "report.csv".into(),
            description: "Monthly Report".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReport {
    pub archive_bytes: usize,
    pub attachment_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub attachment_name: String,
    pub attachment_bytes: usize,
    pub archive_bytes: usize,
}

pub struct Pipeline<B, S> {
    backend: B,
    store: S,
    key: SecretKey,
    codec: Codec,
    label: AttachmentLabel,
    scratch_root: Option<PathBuf>,
}

impl<B: VersionControlBackend, S: ContainerStore> Pipeline<B, S> {
    pub fn new(backend: B, store: S, key: SecretKey) -> Self {
        debug!(key = %key.fingerprint(), "pipeline configured");
        Self {
            backend,
            store,
            key,
            codec: Codec::default(),
            label: AttachmentLabel::default(),
            scratch_root: None,
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_label(mut self, label: AttachmentLabel) -> Self {
        self.label = label;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Archive `source` and write it, encrypted and compressed, into a new container at `output`
    pub fn embed(&self, source: &RepoSource, output: &Path, overwrite: bool) -> Result<EmbedReport> {
        if !overwrite && output.exists() {
            return Err(GitPdfError::OutputExists(output.to_path_buf()));
        }
        info!(
            source = %source,
            output = %output.display(),
            cipher = %self.codec.cipher,
            compression = %self.codec.compression,
            "embedding repository"
        );

        let archive = run_stage(Stage::CreateArchive, || {
            let scratch = self.scratch()?;
            self.backend.create_archive(source, scratch.path())
        })?;
        let sealed = run_stage(Stage::Encrypt, || {
            encrypt(&archive, &self.key, self.codec.cipher)
        })?;
        let packed = run_stage(Stage::Compress, || {
            compress(&sealed, self.codec.compression)
        })?;

        let payload = AttachmentPayload {
            filename: self.label.filename.clone(),
            description: self.label.description.clone(),
            data: packed,
        };
        run_stage(Stage::WriteContainer, || {
            let parent = CreatedParents::prepare(output)?;
            let staged = staging_file(parent.path())?;
            self.store.write_attachment(&payload, staged.path())?;
            persist(staged, output, overwrite)?;
            parent.keep();
            Ok(())
        })?;

        Ok(EmbedReport {
            archive_bytes: archive.len(),
            attachment_bytes: payload.data.len(),
        })
    }

    /// Recover the repository embedded in `input` into the new directory `destination`
    pub fn extract(&self, input: &Path, destination: &Path) -> Result<ExtractReport> {
        ensure_vacant(destination)?;
        info!(
            input = %input.display(),
            destination = %destination.display(),
            cipher = %self.codec.cipher,
            compression = %self.codec.compression,
            authenticated = self.codec.cipher.is_authenticated(),
            "extracting repository"
        );

        let attachment = run_stage(Stage::ReadContainer, || {
            self.store.read_first_attachment(input)
        })?;
        let sealed = run_stage(Stage::Decompress, || {
            decompress(&attachment.data, self.codec.compression)
        })?;
        let archive = run_stage(Stage::Decrypt, || {
            decrypt(&sealed, &self.key, self.codec.cipher)
        })?;

        run_stage(Stage::RestoreArchive, || {
            let scratch = self.scratch()?;
            let parent = CreatedParents::prepare(destination)?;
            let staging = staging_dir(parent.path())?;
            let target = staging.path().join("repository");
            self.backend.restore_archive(&archive, &target, scratch.path())?;
            promote(&target, destination)?;
            parent.keep();
            Ok(())
        })?;

        Ok(ExtractReport {
            attachment_name: attachment.filename,
            attachment_bytes: attachment.data.len(),
            archive_bytes: archive.len(),
        })
    }

    fn scratch(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gitpdf-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "scratch directory created");
        Ok(dir)
    }
}

fn run_stage<T>(stage: Stage, body: impl FnOnce() -> Result<T>) -> Result<T> {
    let span = info_span!("stage", name = %stage);
    let _entered = span.enter();
    debug!("started");
    match body() {
        Ok(value) => {
            debug!("finished");
            Ok(value)
        }
        Err(e) => {
            debug!(error = %e, "stage failed");
            Err(GitPdfError::at(stage, e))
        }
    }
}

/// Directory that will hold an output, plus whatever part of it this run created
///
/// Dropping the guard without calling [`CreatedParents::keep`] removes the
/// directories it created.
struct CreatedParents {
    parent: PathBuf,
    created: Option<PathBuf>,
}

impl CreatedParents {
    fn prepare(path: &Path) -> Result<Self> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let created = parent
            .ancestors()
            .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
            .last()
            .map(Path::to_path_buf);
        let guard = Self { parent, created };
        fs::create_dir_all(&guard.parent)?;
        if let Some(dir) = &guard.created {
            debug!(path = %dir.display(), "created output directory");
        }
        Ok(guard)
    }

    fn path(&self) -> &Path {
        &self.parent
    }

    fn keep(mut self) {
        self.created = None;
    }
}

impl Drop for CreatedParents {
    fn drop(&mut self) {
        if let Some(dir) = self.created.take() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                debug!(path = %dir.display(), error = %e, "could not remove output directory");
            }
        }
    }
}

fn staging_file(parent: &Path) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix(".gitpdf-")
        .suffix(".partial")
        .tempfile_in(parent)?)
}

fn staging_dir(parent: &Path) -> Result<TempDir> {
    Ok(tempfile::Builder::new()
        .prefix(".gitpdf-")
        .tempdir_in(parent)?)
}

fn persist(staged: NamedTempFile, output: &Path, overwrite: bool) -> Result<()> {
    let persisted = if overwrite {
        staged.persist(output)
    } else {
        staged.persist_noclobber(output)
    };
    persisted.map(|_| ()).map_err(|e| match e.error.kind() {
        io::ErrorKind::AlreadyExists => GitPdfError::OutputExists(output.to_path_buf()),
        _ => GitPdfError::Io(e.error),
    })
}

/// Destination must be absent or an empty directory
fn ensure_vacant(destination: &Path) -> Result<()> {
    if !destination.exists() {
        return Ok(());
    }
    if destination.is_dir() && fs::read_dir(destination)?.next().is_none() {
        return Ok(());
    }
    Err(GitPdfError::OutputExists(destination.to_path_buf()))
}

/// Move a fully restored repository into place
fn promote(staged: &Path, destination: &Path) -> Result<()> {
    ensure_vacant(destination)?;
    if destination.exists() {
        fs::remove_dir(destination)?;
    }
    fs::rename(staged, destination)?;
    Ok(())
}
