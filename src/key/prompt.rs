use std::io;

use tracing::debug;

use crate::error::KeyError;
use crate::key::KeyMaterial;
use crate::secret::SecretBuffer;

const ENTER_PROMPT: &str = "Enter password: ";
const VERIFY_PROMPT: &str = "Re-enter password: ";

/// Source of a single line of hidden input.
pub trait TerminalReader {
    /// Shows `prompt` and reads one line without echoing it.
    fn read_hidden(&mut self, prompt: &str) -> io::Result<SecretBuffer>;
}

/// Reads from the controlling terminal, not from standard input, so that
/// piped data is never consumed as a password. Echo is restored on return.
#[derive(Debug, Default)]
pub struct TtyReader;

impl TerminalReader for TtyReader {
    fn read_hidden(&mut self, prompt: &str) -> io::Result<SecretBuffer> {
        rpassword::prompt_password(prompt).map(SecretBuffer::from)
    }
}

/// Asks for a password, twice when `verify` is set.
pub fn prompt_for_key(reader: &mut impl TerminalReader, verify: bool) -> Result<KeyMaterial, KeyError> {
    let first = read_entry(reader, ENTER_PROMPT)?;

    if verify {
        let second = read_entry(reader, VERIFY_PROMPT)?;
        if first != second {
            return Err(KeyError::Mismatch);
        }
    }

    debug!(verify, "password read from terminal");
    KeyMaterial::new(first)
}

fn read_entry(reader: &mut impl TerminalReader, prompt: &str) -> Result<SecretBuffer, KeyError> {
    let raw = reader.read_hidden(prompt).map_err(|e| KeyError::io("unable to read password from terminal", e))?;

    let mut entry = SecretBuffer::with_capacity(raw.len());
    for &byte in raw.as_bytes() {
        if byte >= 0x20 && byte != 0x7F {
            entry.push(byte);
        }
    }

    if entry.is_empty() {
        return Err(KeyError::NoInput);
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Scripted {
        lines: VecDeque<&'static [u8]>,
        prompts: Vec<String>,
    }

    impl Scripted {
        fn new(lines: &[&'static [u8]]) -> Self {
            Self { lines: lines.iter().copied().collect(), prompts: Vec::new() }
        }
    }

    impl TerminalReader for Scripted {
        fn read_hidden(&mut self, prompt: &str) -> io::Result<SecretBuffer> {
            self.prompts.push(prompt.to_string());
            self.lines.pop_front().map(SecretBuffer::from_slice).ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }
    }

    #[test]
    fn test_single_entry() {
        let mut reader = Scripted::new(&[b"swordfish"]);
        let key = prompt_for_key(&mut reader, false).unwrap();
        assert_eq!(key.secret().as_bytes(), b"swordfish");
        assert_eq!(reader.prompts, vec![ENTER_PROMPT]);
    }

    #[test]
    fn test_verified_entry() {
        let mut reader = Scripted::new(&[b"swordfish", b"swordfish"]);
        prompt_for_key(&mut reader, true).unwrap();
        assert_eq!(reader.prompts, vec![ENTER_PROMPT, VERIFY_PROMPT]);
    }

    #[test]
    fn test_mismatch() {
        let mut reader = Scripted::new(&[b"swordfish", b"swordfisk"]);
        assert!(matches!(prompt_for_key(&mut reader, true), Err(KeyError::Mismatch)));
    }

    #[test]
    fn test_empty_entry() {
        let mut reader = Scripted::new(&[b""]);
        assert!(matches!(prompt_for_key(&mut reader, true), Err(KeyError::NoInput)));
    }

    #[test]
    fn test_control_characters_are_discarded() {
        let mut reader = Scripted::new(&[b"pa\x1bss\x07word\x7f"]);
        let key = prompt_for_key(&mut reader, false).unwrap();
        assert_eq!(key.secret().as_bytes(), b"password");

        let mut reader = Scripted::new(&[b"\x01\x02\x03"]);
        assert!(matches!(prompt_for_key(&mut reader, false), Err(KeyError::NoInput)));
    }

    #[test]
    fn test_terminal_failure() {
        let mut reader = Scripted::new(&[]);
        assert!(matches!(prompt_for_key(&mut reader, false), Err(KeyError::Io { .. })));
    }
}
