use crate::error::{GitPdfError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compression algorithm options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Zlib,
    Zstd,
    Lz4,
    Brotli,
    None,
}

impl Compression {
    pub const ALL: [Compression; 5] = [
        Compression::Zlib,
        Compression::Zstd,
        Compression::Lz4,
        Compression::Brotli,
        Compression::None,
    ];
}

impl std::str::FromStr for Compression {
    type Err = GitPdfError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zlib" | "deflate" => Ok(Self::Zlib),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "brotli" => Ok(Self::Brotli),
            "none" => Ok(Self::None),
            _ => Err(GitPdfError::UnsupportedAlgorithm(format!(
                "compression: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zlib => "zlib",
            Self::Zstd => "zstd",
            Self::Lz4 => "lz4",
            Self::Brotli => "brotli",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Symmetric cipher suite options
///
/// `Aes256Cfb` reproduces the legacy attachment layout (16-byte IV, no
/// integrity tag). `Aes256Gcm` appends a 16-byte tag and rejects tampering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CipherSuite {
    #[default]
    Aes256Gcm,
    Aes256Cfb,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 2] = [CipherSuite::Aes256Gcm, CipherSuite::Aes256Cfb];

    /// Length of the IV / nonce prepended to the ciphertext
    pub fn iv_len(&self) -> usize {
        match self {
            Self::Aes256Cfb => 16,
            Self::Aes256Gcm => 12,
        }
    }

    /// Length of the authentication tag appended to the ciphertext
    pub fn tag_len(&self) -> usize {
        match self {
            Self::Aes256Cfb => 0,
            Self::Aes256Gcm => 16,
        }
    }

    /// Smallest blob `decrypt` will accept
    pub fn min_blob_len(&self) -> usize {
        self.iv_len() + self.tag_len()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tag_len() > 0
    }
}

impl std::str::FromStr for CipherSuite {
    type Err = GitPdfError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gcm" | "aes-256-gcm" | "aes256gcm" => Ok(Self::Aes256Gcm),
            "cfb" | "aes-256-cfb" | "aes256cfb" => Ok(Self::Aes256Cfb),
            _ => Err(GitPdfError::UnsupportedAlgorithm(format!("cipher: {}", s))),
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes256Gcm => f.write_str("aes-256-gcm"),
            Self::Aes256Cfb => f.write_str("aes-256-cfb"),
        }
    }
}
