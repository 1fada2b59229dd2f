//! # Password-Based Key Derivation
//!
//! PBKDF2 with HMAC-SHA512 as the pseudo-random function. The derived key is
//! exactly one SHA-512 block, split into the AES-256-GCM key and the header
//! HMAC key.
//!
//! Long iteration counts take seconds, so derivation polls a cancellation
//! flag every [`KDF_CANCEL_INTERVAL`] rounds.

use std::sync::atomic::{AtomicBool, Ordering};

use hmac::{Hmac, Mac as _};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::config::{AES_KEY_SIZE, DERIVED_KEY_LEN, KDF_CANCEL_INTERVAL, MAC_KEY_SIZE};
use crate::error::EngineError;

type HmacSha512 = Hmac<Sha512>;

/// Keys derived from a password and salt.
pub struct DerivedKeys {
    cipher_key: Zeroizing<[u8; AES_KEY_SIZE]>,
    mac_key: Zeroizing<[u8; MAC_KEY_SIZE]>,
}

impl DerivedKeys {
    /// Runs PBKDF2-HMAC-SHA512 for `iterations` rounds.
    ///
    /// # Errors
    /// [`EngineError::InvalidIterations`] for a zero count and
    /// [`EngineError::Cancelled`] once `cancel` is observed set.
    pub fn derive(password: &[u8], salt: &[u8], iterations: u32, cancel: &AtomicBool) -> Result<Self, EngineError> {
        if iterations == 0 {
            return Err(EngineError::InvalidIterations);
        }

        let prf = HmacSha512::new_from_slice(password).map_err(|e| EngineError::Internal(format!("create hmac: {e}")))?;

        // First round: U1 = PRF(P, S || INT(1)).
        let mut mac = prf.clone();
        mac.update(salt);
        mac.update(&1u32.to_be_bytes());

        let mut round = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        round.copy_from_slice(&mac.finalize().into_bytes());
        let mut block = round.clone();

        for i in 1..iterations {
            if i % KDF_CANCEL_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return Err(EngineError::Cancelled);
            }

            let mut mac = prf.clone();
            mac.update(round.as_slice());
            round.copy_from_slice(&mac.finalize().into_bytes());
            block.iter_mut().zip(round.iter()).for_each(|(acc, byte)| *acc ^= byte);
        }

        let (cipher_part, mac_part) = block.split_at(AES_KEY_SIZE);
        let mut cipher_key = Zeroizing::new([0u8; AES_KEY_SIZE]);
        let mut mac_key = Zeroizing::new([0u8; MAC_KEY_SIZE]);
        cipher_key.copy_from_slice(cipher_part);
        mac_key.copy_from_slice(mac_part);

        Ok(Self { cipher_key, mac_key })
    }

    #[inline]
    pub fn cipher_key(&self) -> &[u8; AES_KEY_SIZE] {
        &self.cipher_key
    }

    #[inline]
    pub fn mac_key(&self) -> &[u8; MAC_KEY_SIZE] {
        &self.mac_key
    }

    #[cfg(test)]
    fn concat(&self) -> Vec<u8> {
        [self.cipher_key.as_slice(), self.mac_key.as_slice()].concat()
    }
}

/// Fills an array from the OS random number generator.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], EngineError> {
    let mut bytes = [0u8; N];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| EngineError::Internal(format!("rng failed: {e}")))?;

    Ok(bytes)
}
