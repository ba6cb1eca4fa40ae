use crate::algorithm::CipherSuite;
use crate::error::{GitPdfError, Result};
use crate::key::SecretKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

type Aes256CfbEnc = cfb_mode::Encryptor<aes::Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<aes::Aes256>;

/// Encrypt data under the given suite
/// Output layout: iv || ciphertext (|| tag for authenticated suites)
/// A fresh IV is drawn from the OS CSPRNG on every call
pub fn encrypt(plaintext: &[u8], key: &SecretKey, suite: CipherSuite) -> Result<Vec<u8>> {
    let mut iv = vec![0u8; suite.iv_len()];
    OsRng.fill_bytes(&mut iv);

    let body = match suite {
        CipherSuite::Aes256Cfb => encrypt_cfb(plaintext, key, &iv)?,
        CipherSuite::Aes256Gcm => encrypt_gcm(plaintext, key, &iv)?,
    };

    let mut blob = Vec::with_capacity(iv.len() + body.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&body);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`]
/// CFB carries no integrity check: a wrong key yields garbage, not an error
pub fn decrypt(blob: &[u8], key: &SecretKey, suite: CipherSuite) -> Result<Vec<u8>> {
    if blob.len() < suite.min_blob_len() {
        return Err(GitPdfError::MalformedInput(format!(
            "{} blob is {} bytes, need at least {}",
            suite,
            blob.len(),
            suite.min_blob_len()
        )));
    }

    let (iv, body) = blob.split_at(suite.iv_len());
    match suite {
        CipherSuite::Aes256Cfb => decrypt_cfb(body, key, iv),
        CipherSuite::Aes256Gcm => decrypt_gcm(body, key, iv),
    }
}

fn encrypt_cfb(plaintext: &[u8], key: &SecretKey, iv: &[u8]) -> Result<Vec<u8>> {
    let mut buf = plaintext.to_vec();
    Aes256CfbEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| GitPdfError::MalformedInput(format!("cfb init: {}", e)))?
        .encrypt(&mut buf);
    Ok(buf)
}

fn decrypt_cfb(ciphertext: &[u8], key: &SecretKey, iv: &[u8]) -> Result<Vec<u8>> {
    let mut buf = ciphertext.to_vec();
    Aes256CfbDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| GitPdfError::MalformedInput(format!("cfb init: {}", e)))?
        .decrypt(&mut buf);
    Ok(buf)
}

fn encrypt_gcm(plaintext: &[u8], key: &SecretKey, nonce: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| GitPdfError::InvalidKey(e.to_string()))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| GitPdfError::MalformedInput("gcm: plaintext too large".into()))
}

fn decrypt_gcm(ciphertext: &[u8], key: &SecretKey, nonce: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| GitPdfError::InvalidKey(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| GitPdfError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> SecretKey {
        SecretKey::from_bytes(*b"12345678901234567890123456789012")
    }

    #[test]
    fn test_cfb_layout() {
        let plaintext = b"bundle bytes of some repository";
        let blob = encrypt(plaintext, &key(), CipherSuite::Aes256Cfb).unwrap();
        assert_eq!(blob.len(), 16 + plaintext.len());
        assert_ne!(&blob[16..], plaintext.as_slice());
    }

    #[test]
    fn test_gcm_layout() {
        let plaintext = b"bundle bytes of some repository";
        let blob = encrypt(plaintext, &key(), CipherSuite::Aes256Gcm).unwrap();
        assert_eq!(blob.len(), 12 + plaintext.len() + 16);
    }

    #[test]
    fn test_empty_roundtrip() {
        for suite in CipherSuite::ALL {
            let blob = encrypt(b"", &key(), suite).unwrap();
            assert_eq!(blob.len(), suite.min_blob_len());
            assert!(decrypt(&blob, &key(), suite).unwrap().is_empty());
        }
    }

    #[test]
    fn test_iv_is_fresh_per_call() {
        for suite in CipherSuite::ALL {
            let a = encrypt(b"same plaintext", &key(), suite).unwrap();
            let b = encrypt(b"same plaintext", &key(), suite).unwrap();
            assert_ne!(a[..suite.iv_len()], b[..suite.iv_len()]);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_short_blob_rejected() {
        let err = decrypt(&[0u8; 15], &key(), CipherSuite::Aes256Cfb).unwrap_err();
        assert!(matches!(err, GitPdfError::MalformedInput(_)));

        let err = decrypt(&[0u8; 27], &key(), CipherSuite::Aes256Gcm).unwrap_err();
        assert!(matches!(err, GitPdfError::MalformedInput(_)));
    }

    #[test]
    fn test_cfb_wrong_key_yields_garbage() {
        let plaintext = b"no integrity check in feedback mode";
        let blob = encrypt(plaintext, &key(), CipherSuite::Aes256Cfb).unwrap();
        let other = SecretKey::from_bytes([9u8; 32]);
        let garbage = decrypt(&blob, &other, CipherSuite::Aes256Cfb).unwrap();
        assert_eq!(garbage.len(), plaintext.len());
        assert_ne!(garbage, plaintext);
    }

    #[test]
    fn test_gcm_rejects_tampering() {
        let mut blob = encrypt(b"authenticated payload", &key(), CipherSuite::Aes256Gcm).unwrap();
        blob[14] ^= 0x01;
        let err = decrypt(&blob, &key(), CipherSuite::Aes256Gcm).unwrap_err();
        assert!(matches!(err, GitPdfError::AuthenticationFailed));
    }

    #[test]
    fn test_gcm_rejects_wrong_key() {
        let blob = encrypt(b"authenticated payload", &key(), CipherSuite::Aes256Gcm).unwrap();
        let other = SecretKey::from_bytes([9u8; 32]);
        assert!(matches!(
            decrypt(&blob, &other, CipherSuite::Aes256Gcm),
            Err(GitPdfError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_cfb_known_answer() {
        // NIST SP 800-38A F.3.17 CFB128-AES256.Encrypt, first block
        let key = SecretKey::from_slice(
            &hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap(),
        )
        .unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let mut blob = iv.clone();
        blob.extend_from_slice(&hex::decode("dc7e84bfda79164b7ecd8486985d3860").unwrap());

        assert_eq!(encrypt_cfb(&plaintext, &key, &iv).unwrap(), blob[16..].to_vec());
        assert_eq!(decrypt(&blob, &key, CipherSuite::Aes256Cfb).unwrap(), plaintext);
    }

    proptest! {
        #[test]
        fn prop_cipher_identity(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            for suite in CipherSuite::ALL {
                let blob = encrypt(&data, &key(), suite).unwrap();
                prop_assert_eq!(decrypt(&blob, &key(), suite).unwrap(), data.clone());
            }
        }
    }
}
