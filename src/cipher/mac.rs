use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::MAC_SIZE;
use crate::error::EngineError;

/// HMAC-SHA256 over a sequence of byte slices.
pub struct HeaderMac {
    inner: Hmac<Sha256>,
}

impl HeaderMac {
    pub fn new(key: &[u8]) -> Result<Self, EngineError> {
        if key.is_empty() {
            return Err(EngineError::Internal("empty mac key".into()));
        }

        let inner = Hmac::<Sha256>::new_from_slice(key).map_err(|e| EngineError::Internal(format!("create hmac: {e}")))?;
        Ok(Self { inner })
    }

    pub fn compute(&self, parts: &[&[u8]]) -> [u8; MAC_SIZE] {
        let mut mac = self.inner.clone();
        parts.iter().for_each(|part| mac.update(part));

        mac.finalize().into_bytes().into()
    }

    /// Compares in constant time. A mismatch means a wrong password or a tampered header.
    pub fn verify(&self, expected: &[u8; MAC_SIZE], parts: &[&[u8]]) -> Result<(), EngineError> {
        let computed = self.compute(parts);

        if bool::from(expected.ct_eq(&computed)) { Ok(()) } else { Err(EngineError::AuthenticationFailed) }
    }
}
