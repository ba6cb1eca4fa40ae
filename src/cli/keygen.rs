use crate::error::Result;
use crate::key::SecretKey;
use std::path::Path;

/// Write a fresh random key to `output` and return its fingerprint
pub fn generate_key_file(output: &Path) -> Result<String> {
    let key = SecretKey::generate();
    key.write_hex_file(output)?;
    Ok(key.fingerprint())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generated_key_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gitpdf.key");

        let fingerprint = generate_key_file(&path).unwrap();
        let loaded = SecretKey::from_file(&path).unwrap();
        assert_eq!(loaded.fingerprint(), fingerprint);
        assert!(generate_key_file(&path).is_err());
    }
}
