//! Error types for every stage of the pipeline.
//!
//! Display texts are shown to the user verbatim, followed by their source
//! chain, so they name paths where a path is involved and never include
//! secret material.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Processing;

/// Failures while obtaining or producing key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("password is not valid UTF-8")]
    InvalidEncoding,

    #[error("password must not be empty")]
    Empty,

    #[error("key file is empty: {0}")]
    EmptyKeyFile(PathBuf),

    #[error("key file {path} is malformed: {reason}")]
    BadEncoding { path: PathBuf, reason: &'static str },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("passwords do not match")]
    Mismatch,

    #[error("no password provided")]
    NoInput,

    #[error("key file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("key file size must be greater than zero")]
    ZeroLength,
}

impl KeyError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}

/// Failures while mapping inputs to outputs, detected before any file is touched.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("no input files were given")]
    NoInputs,

    #[error("an output file can only be given with a single input file")]
    AmbiguousTarget,

    #[error("an output file must be given when reading from standard input")]
    MissingOutput,

    #[error("standard input may be named only once")]
    StdinRepeated,

    #[error("Input file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Input name is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Target output cannot be a directory: {0}")]
    OutputIsDirectory(PathBuf),

    #[error("Target output file already exists: {0}")]
    OutputExists(PathBuf),

    #[error("To decrypt a file named .aes, one must specify an output file: {0}")]
    EmptyName(PathBuf),

    #[error("Input file does not end in .aes, so an output file must be specified: {0}")]
    MissingSuffix(PathBuf),

    #[error("unable to inspect {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures reported by an [`Engine`](crate::engine::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("iteration count is out of range")]
    InvalidIterations,

    #[error("input is not an encrypted stream this tool understands")]
    UnrecognizedFormat,

    #[error("unsupported stream version {0}")]
    UnsupportedVersion(u8),

    #[error("authentication failed: wrong password or corrupted input")]
    AuthenticationFailed,

    #[error("encrypted stream is truncated")]
    Truncated,

    #[error("unexpected data after the end of the encrypted stream")]
    TrailingData,

    #[error("read failed")]
    Read(#[source] io::Error),

    #[error("write failed")]
    Write(#[source] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures that end a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("Unable to open input file {path}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to open output file {path}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error {processing} file {path}")]
    Engine {
        processing: Processing,
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Unable to write output file {path}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Processing stopped by termination request")]
    Terminated,
}

impl BatchError {
    /// True when the run ended because the user asked it to stop.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Terminated)
    }
}
