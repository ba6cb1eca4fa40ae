use crate::archive::GitCli;
use crate::container::PdfStore;
use crate::error::Result;
use crate::key::SecretKey;
use crate::orchestrator::{Codec, ExtractReport, Pipeline};
use std::path::{Path, PathBuf};

/// Options for the extract command
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Must match the codec used when embedding
    pub codec: Codec,
    pub scratch_dir: Option<PathBuf>,
}

/// Restore the repository embedded in `input` as a fresh clone at `output`
pub fn extract_repository(
    input: &Path,
    output: &Path,
    key: SecretKey,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut pipeline =
        Pipeline::new(GitCli::new(), PdfStore::default(), key).with_codec(options.codec);
    if let Some(dir) = &options.scratch_dir {
        pipeline = pipeline.with_scratch_root(dir);
    }
    pipeline.extract(input, output)
}
