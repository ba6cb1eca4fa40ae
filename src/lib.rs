//! gitpdf - git repositories carried inside PDF attachments
//!
//! A repository is packed into a git bundle, encrypted, compressed and
//! stored as the single file attachment of an ordinary-looking PDF. The
//! reverse pipeline recovers the bundle byte-for-byte and clones it.
//!
//! ## Transform Pipeline
//!
//! ```text
//! embed:   git bundle → Encrypt → Compress → PDF attachment
//! extract: PDF attachment → Decompress → Decrypt → bundle verify → git clone
//! ```
//!
//! - **Encrypt**: AES-256-GCM (default) or AES-256-CFB (legacy layout,
//!   no integrity tag). The IV is prepended to the ciphertext.
//! - **Compress**: zlib (default), zstd, lz4, brotli, or none
//! - **Container**: one embedded file in the PDF `/EmbeddedFiles` name tree
//!
//! The key is never built in; load it with [`key::load_key`].
//!
//! ## Example
//!
//! ```no_run
//! use gitpdf::cli::{embed_repository, extract_repository, EmbedOptions, ExtractOptions};
//! use gitpdf::key::SecretKey;
//! use std::path::Path;
//!
//! let key = SecretKey::from_file(Path::new("gitpdf.key")).unwrap();
//!
//! embed_repository(
//!     "https://github.com/org/repo.git",
//!     Path::new("report.pdf"),
//!     key.clone(),
//!     &EmbedOptions::default(),
//! ).unwrap();
//!
//! extract_repository(
//!     Path::new("report.pdf"),
//!     Path::new("restored"),
//!     key,
//!     &ExtractOptions::default(),
//! ).unwrap();
//! ```

pub mod algorithm;
pub mod archive;
pub mod cli;
pub mod container;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod pipeline;

pub use algorithm::{CipherSuite, Compression};
pub use error::{GitPdfError, Result};
pub use orchestrator::{Codec, Pipeline, Stage};
