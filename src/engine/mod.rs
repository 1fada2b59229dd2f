//! The engine seam.
//!
//! The batch pipeline only talks to [`Engine`]; [`AesEngine`] is the
//! implementation the binary ships with.

mod aes;
mod header;

use std::io::{Read, Write};

pub use aes::AesEngine;

use crate::error::EngineError;
use crate::secret::SecretBuffer;

/// A name/value pair recorded in the header of an encrypted stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    pub value: String,
}

impl Extension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Encrypts and decrypts whole streams.
///
/// One call runs on a worker thread while [`cancel`](Engine::cancel) may be
/// invoked from the controlling thread; after a cancel the running call should
/// return [`EngineError::Cancelled`] as soon as it can.
pub trait Engine: Sync {
    fn encrypt(
        &self,
        secret: &SecretBuffer,
        iterations: u32,
        extensions: &[Extension],
        input: &mut dyn Read,
        output: &mut dyn Write,
        progress: &mut ProgressSink<'_>,
    ) -> Result<(), EngineError>;

    fn decrypt(&self, secret: &SecretBuffer, input: &mut dyn Read, output: &mut dyn Write, progress: &mut ProgressSink<'_>) -> Result<(), EngineError>;

    fn cancel(&self);
}

/// Receives the number of input bytes consumed so far.
///
/// The callback fires each time another `stride` bytes have been consumed. A
/// stride of zero disables reporting.
pub struct ProgressSink<'a> {
    callback: Option<Box<dyn FnMut(u64) + Send + 'a>>,
    stride: u64,
    consumed: u64,
    next_report: u64,
}

impl<'a> ProgressSink<'a> {
    pub fn new(stride: u64, callback: impl FnMut(u64) + Send + 'a) -> Self {
        Self { callback: Some(Box::new(callback)), stride, consumed: 0, next_report: stride }
    }

    pub fn disabled() -> Self {
        Self { callback: None, stride: 0, consumed: 0, next_report: 0 }
    }

    #[inline]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn advance(&mut self, bytes: u64) {
        self.consumed = self.consumed.saturating_add(bytes);

        if self.stride == 0 || self.consumed < self.next_report {
            return;
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(self.consumed);
        }
        self.next_report = (self.consumed / self.stride + 1).saturating_mul(self.stride);
    }
}
