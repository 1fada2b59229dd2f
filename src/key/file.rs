use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::{KEY_FILE_ALPHABET, STDIO_PATH};
use crate::error::KeyError;
use crate::key::{KeyMaterial, decode_key_text};
use crate::secret::SecretBuffer;

const READ_CHUNK: usize = 4096;

/// Reads key material from `path`, or from standard input when `path` is `-`.
pub fn read_key_file(path: &Path) -> Result<KeyMaterial, KeyError> {
    let raw = if path.as_os_str() == STDIO_PATH {
        read_secret(&mut io::stdin().lock()).map_err(|e| KeyError::io("unable to read key from standard input", e))?
    } else {
        let mut file = File::open(path).map_err(|e| KeyError::io(format!("unable to open key file {}", path.display()), e))?;
        read_secret(&mut file).map_err(|e| KeyError::io(format!("unable to read key file {}", path.display()), e))?
    };

    debug!(path = %path.display(), "read key file");
    decode_key_text(raw, path)
}

/// Reads everything from `reader` without leaving copies outside secret storage.
fn read_secret(reader: &mut impl Read) -> io::Result<SecretBuffer> {
    let mut secret = SecretBuffer::new();
    let mut chunk = Zeroizing::new([0u8; READ_CHUNK]);

    loop {
        match reader.read(chunk.as_mut_slice()) {
            Ok(0) => return Ok(secret),
            Ok(n) => secret.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Writes `octets` random characters from the key alphabet to `path`, or to
/// standard output when `path` is `-`.
///
/// An existing regular file is never overwritten. Devices and pipes are
/// written to as they are. A file created here is removed again if writing
/// to it fails.
pub fn generate_key_file(path: &Path, octets: usize) -> Result<(), KeyError> {
    if octets == 0 {
        return Err(KeyError::ZeroLength);
    }

    let key = random_key(octets)?;

    if path.as_os_str() == STDIO_PATH {
        let mut stdout = io::stdout().lock();
        return stdout
            .write_all(key.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| KeyError::io("unable to write key to standard output", e));
    }

    let (mut file, created) = open_key_target(path)?;

    if let Err(e) = file.write_all(key.as_bytes()).and_then(|()| file.sync_all()) {
        drop(file);
        if created && let Err(remove_err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove_err, "unable to remove incomplete key file");
        }
        return Err(KeyError::io(format!("unable to write key file {}", path.display()), e));
    }

    debug!(path = %path.display(), octets, "generated key file");
    Ok(())
}

fn open_key_target(path: &Path) -> Result<(File, bool), KeyError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Err(KeyError::AlreadyExists(path.to_path_buf())),
        Ok(_) => {
            let file = OpenOptions::new().write(true).open(path).map_err(|e| KeyError::io(format!("unable to open {}", path.display()), e))?;
            Ok((file, false))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let file = OpenOptions::new().write(true).create_new(true).open(path).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => KeyError::AlreadyExists(path.to_path_buf()),
                _ => KeyError::io(format!("unable to create key file {}", path.display()), e),
            })?;
            Ok((file, true))
        }
        Err(e) => Err(KeyError::io(format!("unable to inspect {}", path.display()), e)),
    }
}

fn random_key(octets: usize) -> Result<SecretBuffer, KeyError> {
    let mut entropy = Zeroizing::new(vec![0u8; octets]);
    OsRng.try_fill_bytes(&mut entropy).map_err(|e| KeyError::io("unable to gather random bytes", io::Error::other(e)))?;

    let mut key = SecretBuffer::with_capacity(octets);
    for &byte in entropy.iter() {
        key.push(KEY_FILE_ALPHABET[usize::from(byte & 0x3F)]);
    }

    Ok(key)
}
