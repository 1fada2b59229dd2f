use std::fmt;
use std::str::Utf8Error;

use secrecy::{ExposeSecret, ExposeSecretMut, SecretBox};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Growable byte container for passwords and key material.
///
/// The bytes live in a [`SecretBox`], so they are zeroed when the buffer is
/// dropped on any path, including unwinding. Growth never hands an allocation
/// back to the allocator before it has been zeroed, and truncation wipes the
/// bytes it removes.
pub struct SecretBuffer {
    inner: SecretBox<Vec<u8>>,
}

impl SecretBuffer {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Copies `data` into a new buffer.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut buffer = Self::with_capacity(data.len());
        buffer.extend_from_slice(data);
        buffer
    }

    /// Takes ownership of `data` without copying it.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { inner: SecretBox::new(Box::new(data)) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Views the contents as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    pub fn push(&mut self, byte: u8) {
        self.reserve(1);
        self.inner.expose_secret_mut().push(byte);
    }

    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.reserve(data.len());
        self.inner.expose_secret_mut().extend_from_slice(data);
    }

    /// Appends the UTF-8 encoding of `ch`.
    pub fn push_char(&mut self, ch: char) {
        let mut encoded = [0u8; 4];
        let bytes = ch.encode_utf8(&mut encoded).as_bytes();
        self.extend_from_slice(bytes);
        encoded.zeroize();
    }

    /// Shortens the buffer to `len` bytes, wiping the removed tail.
    pub fn truncate(&mut self, len: usize) {
        let buf = self.inner.expose_secret_mut();
        if len < buf.len() {
            buf[len..].zeroize();
            buf.truncate(len);
        }
    }

    pub fn resize(&mut self, len: usize, value: u8) {
        let current = self.len();
        if len > current {
            self.reserve(len - current);
            self.inner.expose_secret_mut().resize(len, value);
        } else {
            self.truncate(len);
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Makes room for `additional` more bytes.
    ///
    /// When the current allocation is too small the contents move to a new
    /// allocation and the old one is zeroed before it is released.
    fn reserve(&mut self, additional: usize) {
        let buf = self.inner.expose_secret_mut();
        let needed = buf.len().saturating_add(additional);
        if needed <= buf.capacity() {
            return;
        }

        let mut grown = Vec::with_capacity(needed.max(buf.capacity().saturating_mul(2)));
        grown.extend_from_slice(buf);
        let mut old = std::mem::replace(buf, grown);
        old.zeroize();
    }
}

impl Default for SecretBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for SecretBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<String> for SecretBuffer {
    fn from(data: String) -> Self {
        Self::from_vec(data.into_bytes())
    }
}

impl AsRef<[u8]> for SecretBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for SecretBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes().ct_eq(other.as_bytes()).into()
    }
}

impl Eq for SecretBuffer {}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer([... {} bytes ...])", self.len())
    }
}
