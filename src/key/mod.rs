//! Key material acquisition.
//!
//! A secret comes from exactly one source: a password given on the command
//! line, a key file, or an interactive terminal prompt. Each source yields a
//! [`KeyMaterial`], which is always non-empty UTF-8 held in a
//! [`SecretBuffer`].

mod encoding;
mod file;
mod prompt;

pub use encoding::decode_key_text;
pub use file::{generate_key_file, read_key_file};
pub use prompt::{TerminalReader, TtyReader, prompt_for_key};

use crate::error::KeyError;
use crate::secret::SecretBuffer;

/// Non-empty, UTF-8 secret ready to hand to the engine.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyMaterial(SecretBuffer);

impl KeyMaterial {
    /// Validates a secret that already lives in a [`SecretBuffer`].
    pub fn new(secret: SecretBuffer) -> Result<Self, KeyError> {
        if secret.is_empty() {
            return Err(KeyError::Empty);
        }
        if secret.as_str().is_err() {
            return Err(KeyError::InvalidEncoding);
        }

        Ok(Self(secret))
    }

    /// Builds key material from a password given as raw argument bytes,
    /// taking ownership so the bytes are not copied.
    pub fn from_password(raw: Vec<u8>) -> Result<Self, KeyError> {
        Self::new(SecretBuffer::from_vec(raw))
    }

    #[inline]
    pub fn secret(&self) -> &SecretBuffer {
        &self.0
    }

    #[inline]
    pub fn into_secret(self) -> SecretBuffer {
        self.0
    }
}
