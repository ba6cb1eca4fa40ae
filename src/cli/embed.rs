use crate::archive::{GitCli, RepoSource};
use crate::container::{DocumentText, PdfStore};
use crate::error::Result;
use crate::key::SecretKey;
use crate::orchestrator::{AttachmentLabel, Codec, EmbedReport, Pipeline};
use std::path::{Path, PathBuf};

/// Options for the embed command
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    pub codec: Codec,
    pub label: AttachmentLabel,
    pub text: DocumentText,
    /// Replace an existing output file
    pub force: bool,
    /// Parent for scratch directories (system temp dir when unset)
    pub scratch_dir: Option<PathBuf>,
}

/// Bundle the repository at `repo` (local path or remote URL) into a PDF at `output`
pub fn embed_repository(
    repo: &str,
    output: &Path,
    key: SecretKey,
    options: &EmbedOptions,
) -> Result<EmbedReport> {
    let source = RepoSource::parse(repo);
    let mut pipeline = Pipeline::new(GitCli::new(), PdfStore::new(options.text.clone()), key)
        .with_codec(options.codec)
        .with_label(options.label.clone());
    if let Some(dir) = &options.scratch_dir {
        pipeline = pipeline.with_scratch_root(dir);
    }
    pipeline.embed(&source, output, options.force)
}
