//! Common type definitions.
//!
//! - [`Mode`]: the operation selected on the command line
//! - [`Processing`]: the direction a batch runs in, with labels for output

use strum::Display;

/// Operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Mode {
    /// Encrypt every input, producing `<name>.aes`.
    #[strum(to_string = "encrypt")]
    Encrypt,

    /// Decrypt every input, removing the `.aes` suffix.
    #[strum(to_string = "decrypt")]
    Decrypt,

    /// Write a freshly generated key file.
    #[strum(to_string = "generate")]
    Generate,
}

impl Mode {
    /// Returns the batch direction for modes that process files.
    #[inline]
    pub fn processing(self) -> Option<Processing> {
        match self {
            Self::Encrypt => Some(Processing::Encryption),
            Self::Decrypt => Some(Processing::Decryption),
            Self::Generate => None,
        }
    }
}

/// Direction of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Processing {
    #[strum(to_string = "encrypting")]
    Encryption,

    #[strum(to_string = "decrypting")]
    Decryption,
}

impl Processing {
    /// Status line prefix shown before each file name.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encryption => "Encrypting",
            Self::Decryption => "Decrypting",
        }
    }

    /// Past tense used in the summary line.
    #[inline]
    pub fn past(self) -> &'static str {
        match self {
            Self::Encryption => "encrypted",
            Self::Decryption => "decrypted",
        }
    }
}
