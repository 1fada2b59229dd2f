use std::path::Path;

use crate::error::KeyError;
use crate::key::KeyMaterial;
use crate::secret::SecretBuffer;

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

/// Turns the raw contents of a key file into key material.
///
/// Files starting with a UTF-16 byte order mark are transcoded to UTF-8.
/// Anything else is read as UTF-8 up to the first NUL, CR or LF. `path` is
/// only used in error messages.
pub fn decode_key_text(raw: SecretBuffer, path: &Path) -> Result<KeyMaterial, KeyError> {
    if raw.is_empty() {
        return Err(KeyError::EmptyKeyFile(path.to_path_buf()));
    }

    match detect(raw.as_bytes()) {
        Some(TextEncoding::Utf8) => decode_utf8(raw, path),
        Some(encoding) => decode_utf16(&raw, encoding, path),
        None => Err(KeyError::BadEncoding { path: path.to_path_buf(), reason: "incomplete UTF-16 byte order mark" }),
    }
}

/// Classifies by the first two bytes. A leading 0xFE or 0xFF can never start
/// UTF-8 text, so such a file must carry a complete UTF-16 byte order mark.
fn detect(bytes: &[u8]) -> Option<TextEncoding> {
    match bytes {
        [0xFF, 0xFE, ..] => Some(TextEncoding::Utf16Le),
        [0xFE, 0xFF, ..] => Some(TextEncoding::Utf16Be),
        [0xFE | 0xFF, ..] => None,
        _ => Some(TextEncoding::Utf8),
    }
}

fn decode_utf8(mut raw: SecretBuffer, path: &Path) -> Result<KeyMaterial, KeyError> {
    if let Some(end) = raw.as_bytes().iter().position(|&b| matches!(b, b'\0' | b'\r' | b'\n')) {
        raw.truncate(end);
    }

    if raw.is_empty() {
        return Err(KeyError::EmptyKeyFile(path.to_path_buf()));
    }
    if raw.as_str().is_err() {
        return Err(KeyError::BadEncoding { path: path.to_path_buf(), reason: "not valid UTF-8" });
    }

    KeyMaterial::new(raw)
}

fn decode_utf16(raw: &SecretBuffer, encoding: TextEncoding, path: &Path) -> Result<KeyMaterial, KeyError> {
    let bytes = raw.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(KeyError::BadEncoding { path: path.to_path_buf(), reason: "odd number of bytes in UTF-16 text" });
    }
    if bytes.len() < 4 {
        return Err(KeyError::BadEncoding { path: path.to_path_buf(), reason: "UTF-16 text holds no characters" });
    }

    let units = bytes[BOM_LE.len()..].chunks_exact(2).map(|pair| match encoding {
        TextEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
        _ => u16::from_le_bytes([pair[0], pair[1]]),
    });

    // Worst case every code unit becomes three UTF-8 bytes.
    let mut decoded = SecretBuffer::with_capacity((bytes.len() - BOM_BE.len()) / 2 * 3);
    for unit in char::decode_utf16(units) {
        match unit {
            Ok(ch) => decoded.push_char(ch),
            Err(_) => return Err(KeyError::BadEncoding { path: path.to_path_buf(), reason: "unpaired UTF-16 surrogate" }),
        }
    }

    KeyMaterial::new(decoded)
}
