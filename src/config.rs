//! Global Configuration Constants
//!
//! Every tunable of the tool lives here: naming conventions for encrypted
//! files, key derivation bounds, key file sizes, I/O buffer sizes and the
//! framing parameters of the encrypted stream.

/// Application name used in the `CREATED_BY` extension and version output.
pub const APP_NAME: &str = "aesbatch";

/// Application version, taken from the package manifest.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Suffix appended to encrypted files and stripped when decrypting.
pub const FILE_EXTENSION: &str = ".aes";

/// Name of the header extension that records which tool produced a file.
pub const CREATED_BY_EXTENSION: &str = "CREATED_BY";

/// Path argument that stands for standard input or standard output.
pub const STDIO_PATH: &str = "-";

// === Key derivation ===

/// Smallest accepted KDF iteration count.
pub const KDF_MIN_ITERATIONS: u32 = 1;

/// Iteration count used when `--iterations` is not given.
pub const KDF_DEFAULT_ITERATIONS: u32 = 300_000;

/// Largest accepted KDF iteration count.
pub const KDF_MAX_ITERATIONS: u32 = 5_000_000;

/// How many KDF iterations run between two cancellation checks.
pub const KDF_CANCEL_INTERVAL: u32 = 4096;

/// Output length of the KDF: an AES-256 key followed by an HMAC key.
pub const DERIVED_KEY_LEN: usize = 64;

/// AES-256 key length in bytes.
pub const AES_KEY_SIZE: usize = 32;

/// HMAC-SHA256 key length in bytes.
pub const MAC_KEY_SIZE: usize = 32;

// === Key files ===

/// Default number of octets in a generated key file.
pub const KEY_FILE_DEFAULT_SIZE: u16 = 64;

/// Smallest key file `--keysize` accepts.
pub const KEY_FILE_MIN_SIZE: u16 = 43;

/// Largest key file `--keysize` accepts.
pub const KEY_FILE_MAX_SIZE: u16 = 4096;

/// Symbols a generated key file is drawn from; indexed by `byte & 0x3F`.
pub const KEY_FILE_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_+";

// === I/O ===

/// Capacity of the buffered reader and writer wrapped around every stream.
pub const BUFFERED_IO_SIZE: usize = 131_072;

/// Width of the progress meter in cells; also the update granularity.
pub const METER_WIDTH: u64 = 40;

// === Encrypted stream layout ===

/// Magic bytes at the start of every encrypted stream.
pub const MAGIC: &[u8; 4] = b"AESB";

/// Stream format version written by this build.
pub const FORMAT_VERSION: u8 = 1;

/// Random salt fed to the KDF.
pub const SALT_SIZE: usize = 16;

/// Random prefix of every per-chunk nonce; the remaining four bytes are the chunk counter.
pub const NONCE_PREFIX_SIZE: usize = 8;

/// AES-GCM nonce length.
pub const AES_NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_SIZE: usize = 16;

/// HMAC-SHA256 output length.
pub const MAC_SIZE: usize = 32;

/// Plaintext bytes per encrypted frame.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Largest number of extensions a header may carry.
pub const MAX_EXTENSIONS: usize = 64;
