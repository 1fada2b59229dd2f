//! Cryptographic primitives used by the engine: AES-256-GCM for the payload,
//! PBKDF2-HMAC-SHA512 for key derivation and HMAC-SHA256 for the header.

mod aes_gcm;
mod derive;
mod mac;

pub use aes_gcm::AesGcm;
pub use derive::{DerivedKeys, random_bytes};
pub use mac::HeaderMac;
