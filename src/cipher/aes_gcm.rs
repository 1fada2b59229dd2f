use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::config::{AES_KEY_SIZE, AES_NONCE_SIZE};
use crate::error::EngineError;

pub struct AesGcm {
    inner: Aes256Gcm,
}

impl AesGcm {
    #[inline]
    pub fn new(key: &[u8; AES_KEY_SIZE]) -> Result<Self, EngineError> {
        let inner = Aes256Gcm::new_from_slice(key).map_err(|e| EngineError::Internal(format!("aes-gcm key setup failed: {e}")))?;
        Ok(Self { inner })
    }

    /// Encrypts `plaintext`, returning ciphertext with the tag appended.
    #[inline]
    pub fn seal(&self, nonce: &[u8; AES_NONCE_SIZE], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EngineError> {
        self.inner
            .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|_| EngineError::Internal("aes-gcm encryption failed".into()))
    }

    /// Verifies and decrypts `ciphertext`. Nothing is returned unless the tag matches.
    #[inline]
    pub fn open(&self, nonce: &[u8; AES_NONCE_SIZE], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EngineError> {
        self.inner.decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad }).map_err(|_| EngineError::AuthenticationFailed)
    }
}
