// ABOUTME: Symmetric cipher used to wrap client credentials into one opaque string
// ABOUTME: AES-256-GCM with a SHA-256 derived key and a random nonce prefix
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::errors::{AppError, AppResult};

const NONCE_LEN: usize = 12;

/// Symmetric encryption keyed by a shared secret string
pub trait SymmetricCipher: Send + Sync {
    /// Encrypt `plaintext` into a URL-safe string
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher rejects the input
    fn encrypt(&self, plaintext: &str, secret: &str) -> AppResult<String>;

    /// Decrypt a value produced by [`SymmetricCipher::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns a `DecryptionFailed` error if the value is malformed, was produced
    /// with another secret, or was tampered with
    fn decrypt(&self, ciphertext: &str, secret: &str) -> AppResult<String>;
}

/// AES-256-GCM cipher; output is `base64url(nonce || ciphertext || tag)`
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    fn derive_key(secret: &str) -> Zeroizing<[u8; 32]> {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&digest);
        key
    }
}

impl SymmetricCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str, secret: &str) -> AppResult<String> {
        let key = Self::derive_key(secret);
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_slice()));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::internal(format!("Encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> AppResult<String> {
        let sealed = URL_SAFE_NO_PAD
            .decode(ciphertext.trim())
            .map_err(|e| AppError::decryption(format!("Malformed ciphertext: {e}")))?;

        if sealed.len() <= NONCE_LEN {
            return Err(AppError::decryption("Encrypted data too short"));
        }

        let key = Self::derive_key(secret);
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_slice()));
        let (nonce_bytes, body) = sealed.split_at(NONCE_LEN);

        let plaintext = cipher
            .decrypt(GenericArray::from_slice(nonce_bytes), body)
            .map_err(|_| AppError::decryption("Ciphertext failed authentication"))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::decryption(format!("Decrypted data is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_secret_fails_authentication() {
        let cipher = AesGcmCipher;
        let sealed = cipher.encrypt("hello", "secret-a").unwrap();
        let error = cipher.decrypt(&sealed, "secret-b").unwrap_err();
        assert_eq!(error.code, crate::errors::ErrorCode::DecryptionFailed);
    }

    #[test]
    fn test_nonce_makes_ciphertexts_distinct() {
        let cipher = AesGcmCipher;
        let first = cipher.encrypt("hello", "secret").unwrap();
        let second = cipher.encrypt("hello", "secret").unwrap();
        assert_ne!(first, second);
    }
}
