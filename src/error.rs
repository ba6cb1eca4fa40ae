use crate::orchestrator::Stage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitPdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Authentication failed: ciphertext was tampered with or the key is wrong")]
    AuthenticationFailed,

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("No attachment found in {}", .0.display())]
    NoAttachment(PathBuf),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend command `{command}` failed: {stderr}")]
    BackendFailed { command: String, stderr: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<GitPdfError>,
    },
}

impl GitPdfError {
    /// Wrap an error with the pipeline stage it came from
    pub fn at(stage: Stage, source: GitPdfError) -> Self {
        Self::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Innermost cause, skipping any stage wrappers
    pub fn root(&self) -> &GitPdfError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage the error was raised in, if it came out of the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitPdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wrapper_reports_root_cause() {
        let err = GitPdfError::at(
            Stage::ReadContainer,
            GitPdfError::NoAttachment(PathBuf::from("empty.pdf")),
        );
        assert_eq!(err.stage(), Some(Stage::ReadContainer));
        assert!(matches!(err.root(), GitPdfError::NoAttachment(_)));
        assert_eq!(
            err.to_string(),
            "read-container failed: No attachment found in empty.pdf"
        );
    }

    #[test]
    fn test_unwrapped_error_has_no_stage() {
        let err = GitPdfError::MalformedInput("short".into());
        assert_eq!(err.stage(), None);
        assert!(matches!(err.root(), GitPdfError::MalformedInput(_)));
    }
}
