//! Symmetric key material.
//!
//! Keys are never compiled in. They come from a key file (32 raw bytes or
//! 64 hex characters) or from a hex string, usually the `GITPDF_KEY`
//! environment variable.

use crate::error::{GitPdfError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::env::VarError;
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// Environment variable holding a hex-encoded key
pub const KEY_ENV: &str = "GITPDF_KEY";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh key from the system CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(GitPdfError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        let mut decoded = hex::decode(text.trim())
            .map_err(|e| GitPdfError::InvalidKey(format!("hex: {}", e)))?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    /// Load a key file holding either 32 raw bytes or 64 hex characters
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut contents = std::fs::read(path)?;
        let key = if contents.len() == KEY_LEN {
            Self::from_slice(&contents)
        } else {
            match std::str::from_utf8(&contents) {
                Ok(text) => Self::from_hex(text),
                Err(_) => Err(GitPdfError::InvalidKey(format!(
                    "{}: expected {} raw bytes or {} hex characters",
                    path.display(),
                    KEY_LEN,
                    KEY_LEN * 2
                ))),
            }
        };
        contents.zeroize();
        key
    }

    /// Write the key as hex, refusing to overwrite an existing file
    pub fn write_hex_file(&self, path: &Path) -> Result<()> {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => GitPdfError::OutputExists(path.to_path_buf()),
                _ => GitPdfError::Io(e),
            })?;
        let mut encoded = hex::encode(self.0);
        encoded.push('\n');
        let written = file.write_all(encoded.as_bytes());
        encoded.zeroize();
        written?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Short SHA-256 fingerprint, safe to print and log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }
}

/// Key from `key_file` when given, otherwise from the `GITPDF_KEY` environment variable
pub fn load_key(key_file: Option<&Path>) -> Result<SecretKey> {
    if let Some(path) = key_file {
        return SecretKey::from_file(path);
    }
    key_from_env(std::env::var(KEY_ENV))
}

fn key_from_env(value: std::result::Result<String, VarError>) -> Result<SecretKey> {
    match value {
        Ok(text) => SecretKey::from_hex(&text),
        Err(VarError::NotUnicode(_)) => Err(GitPdfError::InvalidKey(format!(
            "{} is malformed; expected {} hex characters",
            KEY_ENV,
            KEY_LEN * 2
        ))),
        Err(VarError::NotPresent) => Err(GitPdfError::InvalidKey(format!(
            "no key configured; pass --key-file or set {}",
            KEY_ENV
        ))),
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({})", self.fingerprint())
    }
}
