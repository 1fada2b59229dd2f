use std::io::{self, Read};

use crate::config::{FORMAT_VERSION, KDF_MAX_ITERATIONS, KDF_MIN_ITERATIONS, MAC_SIZE, MAGIC, MAX_EXTENSIONS, NONCE_PREFIX_SIZE, SALT_SIZE};
use crate::engine::Extension;
use crate::error::EngineError;

/// Everything in front of the first frame, apart from the trailing MAC.
///
/// Layout, integers big-endian:
///
/// ```text
/// magic[4] version[1] count[2] { name_len[2] name value_len[2] value }*
/// iterations[4] salt[16] nonce_prefix[8] mac[32]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub extensions: Vec<Extension>,
    pub iterations: u32,
    pub salt: [u8; SALT_SIZE],
    pub nonce_prefix: [u8; NONCE_PREFIX_SIZE],
}

impl Header {
    /// Serializes the header up to, but not including, the MAC.
    pub fn encode(&self) -> Result<Vec<u8>, EngineError> {
        if self.extensions.len() > MAX_EXTENSIONS {
            return Err(EngineError::Internal(format!("too many header extensions: {}", self.extensions.len())));
        }

        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&encode_len(self.extensions.len())?);
        for extension in &self.extensions {
            out.extend_from_slice(&encode_len(extension.name.len())?);
            out.extend_from_slice(extension.name.as_bytes());
            out.extend_from_slice(&encode_len(extension.value.len())?);
            out.extend_from_slice(extension.value.as_bytes());
        }
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce_prefix);

        Ok(out)
    }

    /// Reads a header and its MAC, returning the raw bytes the MAC covers.
    pub fn read_from(reader: &mut dyn Read) -> Result<(Self, Vec<u8>, [u8; MAC_SIZE]), EngineError> {
        let mut raw = HeaderReader { reader: &mut *reader, raw: Vec::with_capacity(64) };

        let magic: [u8; 4] = raw.take().map_err(|e| match e {
            EngineError::Truncated => EngineError::UnrecognizedFormat,
            other => other,
        })?;
        if &magic != MAGIC {
            return Err(EngineError::UnrecognizedFormat);
        }

        let [version]: [u8; 1] = raw.take()?;
        if version != FORMAT_VERSION {
            return Err(EngineError::UnsupportedVersion(version));
        }

        let count = usize::from(u16::from_be_bytes(raw.take()?));
        if count > MAX_EXTENSIONS {
            return Err(EngineError::UnrecognizedFormat);
        }

        let mut extensions = Vec::with_capacity(count);
        for _ in 0..count {
            let name = raw.take_string()?;
            let value = raw.take_string()?;
            extensions.push(Extension { name, value });
        }

        let iterations = u32::from_be_bytes(raw.take()?);
        if !(KDF_MIN_ITERATIONS..=KDF_MAX_ITERATIONS).contains(&iterations) {
            return Err(EngineError::UnrecognizedFormat);
        }

        let salt = raw.take()?;
        let nonce_prefix = raw.take()?;
        let covered = raw.raw;

        let mut mac = [0u8; MAC_SIZE];
        read_exact(reader, &mut mac)?;

        Ok((Self { extensions, iterations, salt, nonce_prefix }, covered, mac))
    }
}

/// Reads fields while keeping a copy of every byte for MAC verification.
struct HeaderReader<'a> {
    reader: &'a mut dyn Read,
    raw: Vec<u8>,
}

impl HeaderReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], EngineError> {
        let mut bytes = [0u8; N];
        read_exact(self.reader, &mut bytes)?;
        self.raw.extend_from_slice(&bytes);
        Ok(bytes)
    }

    fn take_string(&mut self) -> Result<String, EngineError> {
        let len = usize::from(u16::from_be_bytes(self.take()?));
        let mut bytes = vec![0u8; len];
        read_exact(self.reader, &mut bytes)?;
        self.raw.extend_from_slice(&bytes);
        String::from_utf8(bytes).map_err(|_| EngineError::UnrecognizedFormat)
    }
}

/// `read_exact` with end-of-input reported as truncation.
pub fn read_exact(reader: &mut dyn Read, buf: &mut [u8]) -> Result<(), EngineError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => EngineError::Truncated,
        _ => EngineError::Read(e),
    })
}

fn encode_len(len: usize) -> Result<[u8; 2], EngineError> {
    u16::try_from(len).map(u16::to_be_bytes).map_err(|_| EngineError::Internal(format!("header field too long: {len} bytes")))
}
