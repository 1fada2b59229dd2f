use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher::{AesGcm, DerivedKeys, HeaderMac, random_bytes};
use crate::config::{AES_NONCE_SIZE, CHUNK_SIZE, KDF_MAX_ITERATIONS, KDF_MIN_ITERATIONS, MAC_SIZE, NONCE_PREFIX_SIZE, TAG_SIZE};
use crate::engine::header::{Header, read_exact};
use crate::engine::{Engine, Extension, ProgressSink};
use crate::error::EngineError;
use crate::secret::SecretBuffer;

const FRAME_MORE: u8 = 0;
const FRAME_FINAL: u8 = 1;
const FRAME_PREFIX: usize = 5;

/// Streaming AES-256-GCM engine.
///
/// The payload is cut into frames of at most [`CHUNK_SIZE`] plaintext bytes.
/// Each frame is sealed with a nonce built from a random per-stream prefix and
/// the frame counter, and authenticates its own final flag, so reordering,
/// dropping or appending frames is detected. The engine is meant to be used
/// for one stream; a cancel stays in effect for its lifetime.
#[derive(Debug, Default)]
pub struct AesEngine {
    cancelled: AtomicBool,
}

impl AesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn check_cancel(&self) -> Result<(), EngineError> {
        if self.cancelled.load(Ordering::Relaxed) { Err(EngineError::Cancelled) } else { Ok(()) }
    }
}

impl Engine for AesEngine {
    fn encrypt(
        &self,
        secret: &SecretBuffer,
        iterations: u32,
        extensions: &[Extension],
        input: &mut dyn Read,
        output: &mut dyn Write,
        progress: &mut ProgressSink<'_>,
    ) -> Result<(), EngineError> {
        if secret.is_empty() {
            return Err(EngineError::EmptyPassword);
        }
        if !(KDF_MIN_ITERATIONS..=KDF_MAX_ITERATIONS).contains(&iterations) {
            return Err(EngineError::InvalidIterations);
        }

        let header = Header { extensions: extensions.to_vec(), iterations, salt: random_bytes()?, nonce_prefix: random_bytes()? };
        let keys = DerivedKeys::derive(secret.as_bytes(), &header.salt, iterations, &self.cancelled)?;
        let cipher = AesGcm::new(keys.cipher_key())?;

        let encoded = header.encode()?;
        let mac = HeaderMac::new(keys.mac_key())?.compute(&[&encoded]);
        output.write_all(&encoded).map_err(EngineError::Write)?;
        output.write_all(&mac).map_err(EngineError::Write)?;

        let mut chunk = Zeroizing::new(vec![0u8; CHUNK_SIZE]);
        let mut counter = 0u32;

        loop {
            self.check_cancel()?;

            let filled = fill(input, &mut chunk)?;
            let flag = if filled < CHUNK_SIZE { FRAME_FINAL } else { FRAME_MORE };

            let sealed = cipher.seal(&frame_nonce(&header.nonce_prefix, counter), &frame_aad(flag, counter), &chunk[..filled])?;
            let len = u32::try_from(sealed.len()).map_err(|_| EngineError::Internal("frame too large".into()))?;

            output.write_all(&[flag]).map_err(EngineError::Write)?;
            output.write_all(&len.to_be_bytes()).map_err(EngineError::Write)?;
            output.write_all(&sealed).map_err(EngineError::Write)?;
            progress.advance(filled as u64);

            if flag == FRAME_FINAL {
                break;
            }
            counter = counter.checked_add(1).ok_or_else(|| EngineError::Internal("too many frames".into()))?;
        }

        debug!(frames = u64::from(counter) + 1, bytes = progress.consumed(), "stream encrypted");
        Ok(())
    }

    fn decrypt(&self, secret: &SecretBuffer, input: &mut dyn Read, output: &mut dyn Write, progress: &mut ProgressSink<'_>) -> Result<(), EngineError> {
        if secret.is_empty() {
            return Err(EngineError::EmptyPassword);
        }

        let (header, covered, mac) = Header::read_from(input)?;
        progress.advance((covered.len() + MAC_SIZE) as u64);
        for extension in &header.extensions {
            debug!(name = %extension.name, value = %extension.value, "header extension");
        }

        let keys = DerivedKeys::derive(secret.as_bytes(), &header.salt, header.iterations, &self.cancelled)?;
        HeaderMac::new(keys.mac_key())?.verify(&mac, &[&covered])?;
        let cipher = AesGcm::new(keys.cipher_key())?;

        let mut sealed = Vec::with_capacity(CHUNK_SIZE + TAG_SIZE);
        let mut counter = 0u32;

        loop {
            self.check_cancel()?;

            let mut prefix = [0u8; FRAME_PREFIX];
            read_exact(input, &mut prefix)?;
            let [flag, len @ ..] = prefix;
            let len = u32::from_be_bytes(len) as usize;
            if !matches!(flag, FRAME_MORE | FRAME_FINAL) || !(TAG_SIZE..=CHUNK_SIZE + TAG_SIZE).contains(&len) {
                return Err(EngineError::UnrecognizedFormat);
            }

            sealed.resize(len, 0);
            read_exact(input, &mut sealed)?;

            let plaintext = Zeroizing::new(cipher.open(&frame_nonce(&header.nonce_prefix, counter), &frame_aad(flag, counter), &sealed)?);
            output.write_all(&plaintext).map_err(EngineError::Write)?;
            progress.advance((FRAME_PREFIX + len) as u64);

            if flag == FRAME_FINAL {
                break;
            }
            counter = counter.checked_add(1).ok_or(EngineError::UnrecognizedFormat)?;
        }

        ensure_exhausted(input)?;
        debug!(frames = u64::from(counter) + 1, bytes = progress.consumed(), "stream decrypted");
        Ok(())
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

fn frame_nonce(prefix: &[u8; NONCE_PREFIX_SIZE], counter: u32) -> [u8; AES_NONCE_SIZE] {
    let mut nonce = [0u8; AES_NONCE_SIZE];
    nonce[..NONCE_PREFIX_SIZE].copy_from_slice(prefix);
    nonce[NONCE_PREFIX_SIZE..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

fn frame_aad(flag: u8, counter: u32) -> [u8; 5] {
    let mut aad = [flag, 0, 0, 0, 0];
    aad[1..].copy_from_slice(&counter.to_be_bytes());
    aad
}

/// Reads until `buf` is full or the input ends.
fn fill(input: &mut dyn Read, buf: &mut [u8]) -> Result<usize, EngineError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(EngineError::Read(e)),
        }
    }
    Ok(filled)
}

fn ensure_exhausted(input: &mut dyn Read) -> Result<(), EngineError> {
    let mut probe = [0u8; 1];
    loop {
        match input.read(&mut probe) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(EngineError::TrailingData),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(EngineError::Read(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const ITERATIONS: u32 = 16;

    fn secret(text: &str) -> SecretBuffer {
        SecretBuffer::from_slice(text.as_bytes())
    }

    fn encrypt(password: &str, plaintext: &[u8]) -> Vec<u8> {
        let mut output = Vec::new();
        AesEngine::new()
            .encrypt(&secret(password), ITERATIONS, &[Extension::new("CREATED_BY", "tests")], &mut &plaintext[..], &mut output, &mut ProgressSink::disabled())
            .unwrap();
        output
    }

    fn decrypt(password: &str, ciphertext: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut output = Vec::new();
        AesEngine::new().decrypt(&secret(password), &mut &ciphertext[..], &mut output, &mut ProgressSink::disabled())?;
        Ok(output)
    }

    #[test]
    fn test_roundtrip_sizes() {
        for size in [0, 1, 1000, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE - 7] {
            let plaintext: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
            let ciphertext = encrypt("hunter2", &plaintext);
            assert_eq!(decrypt("hunter2", &ciphertext).unwrap(), plaintext, "size {size}");
        }
    }

    #[test]
    fn test_ciphertexts_differ() {
        assert_ne!(encrypt("pw", b"same input"), encrypt("pw", b"same input"));
    }

    #[test]
    fn test_wrong_password() {
        let ciphertext = encrypt("right", b"secret data");
        assert!(matches!(decrypt("wrong", &ciphertext), Err(EngineError::AuthenticationFailed)));
    }

    #[test]
    fn test_truncated_stream() {
        let ciphertext = encrypt("pw", &vec![7u8; CHUNK_SIZE + 100]);
        assert!(matches!(decrypt("pw", &ciphertext[..ciphertext.len() - 1]), Err(EngineError::Truncated)));

        // Cutting exactly after a complete non-final frame.
        let first_frame_end = ciphertext.len() - (FRAME_PREFIX + 100 + TAG_SIZE);
        assert!(matches!(decrypt("pw", &ciphertext[..first_frame_end]), Err(EngineError::Truncated)));
    }

    #[test]
    fn test_trailing_data() {
        let mut ciphertext = encrypt("pw", b"payload");
        ciphertext.push(0);
        assert!(matches!(decrypt("pw", &ciphertext), Err(EngineError::TrailingData)));
    }

    #[test]
    fn test_tampered_frame() {
        let mut ciphertext = encrypt("pw", b"payload");
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;
        assert!(matches!(decrypt("pw", &ciphertext), Err(EngineError::AuthenticationFailed)));
    }

    #[test]
    fn test_not_encrypted() {
        assert!(matches!(decrypt("pw", b"just some text"), Err(EngineError::UnrecognizedFormat)));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let engine = AesEngine::new();
        let mut output = Vec::new();

        let result = engine.encrypt(&SecretBuffer::new(), ITERATIONS, &[], &mut &b"x"[..], &mut output, &mut ProgressSink::disabled());
        assert!(matches!(result, Err(EngineError::EmptyPassword)));

        let result = engine.encrypt(&secret("pw"), 0, &[], &mut &b"x"[..], &mut output, &mut ProgressSink::disabled());
        assert!(matches!(result, Err(EngineError::InvalidIterations)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_cancel_before_start() {
        let engine = AesEngine::new();
        engine.cancel();

        let mut output = Vec::new();
        let result = engine.encrypt(&secret("pw"), ITERATIONS, &[], &mut &b"data"[..], &mut output, &mut ProgressSink::disabled());
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[test]
    fn test_progress_reports_input_bytes() {
        let plaintext = vec![1u8; 3 * CHUNK_SIZE];
        let reports = Mutex::new(Vec::new());

        let mut output = Vec::new();
        let mut sink = ProgressSink::new(CHUNK_SIZE as u64, |offset| reports.lock().unwrap().push(offset));
        AesEngine::new().encrypt(&secret("pw"), ITERATIONS, &[], &mut &plaintext[..], &mut output, &mut sink).unwrap();
        assert_eq!(sink.consumed(), plaintext.len() as u64);
        drop(sink);

        let reports = reports.into_inner().unwrap();
        assert_eq!(reports, vec![CHUNK_SIZE as u64, 2 * CHUNK_SIZE as u64, 3 * CHUNK_SIZE as u64]);
    }
}
