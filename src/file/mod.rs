//! Mapping of input files to output targets.
//!
//! Resolution only inspects the filesystem; it never creates, opens or
//! removes anything. Opening and cleaning up happens in [`stream`].

pub mod stream;

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::{FILE_EXTENSION, STDIO_PATH};
use crate::error::TargetError;
use crate::types::Processing;

pub use stream::{InputStream, OutputStream, discard_output, open_input, open_output};

/// One resolved input to output mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Size of the input in bytes; unknown for standard input.
    pub known_size: Option<u64>,
    /// Set only when the output path did not exist at resolution time.
    pub remove_on_failure: bool,
}

impl FileJob {
    #[inline]
    pub fn reads_stdin(&self) -> bool {
        is_stdio(&self.input)
    }

    #[inline]
    pub fn writes_stdout(&self) -> bool {
        is_stdio(&self.output)
    }
}

/// True for the `-` placeholder that stands for standard input or output.
#[inline]
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

/// Checks the whole batch before any file is touched.
pub fn check_batch(processing: Processing, inputs: &[PathBuf], output: Option<&Path>) -> Result<(), TargetError> {
    if inputs.is_empty() {
        return Err(TargetError::NoInputs);
    }

    let stdin_count = inputs.iter().filter(|input| is_stdio(input)).count();
    if stdin_count > 1 {
        return Err(TargetError::StdinRepeated);
    }
    if output.is_some() && inputs.len() > 1 {
        return Err(TargetError::AmbiguousTarget);
    }
    if output.is_none() && stdin_count > 0 {
        return Err(TargetError::MissingOutput);
    }

    if processing == Processing::Decryption && output.is_none() {
        for input in inputs {
            default_output(processing, input)?;
        }
    }

    Ok(())
}

/// Output name derived from the input name.
///
/// Encryption appends `.aes`. Decryption strips a trailing `.aes`, compared
/// without regard to ASCII case.
pub fn default_output(processing: Processing, input: &Path) -> Result<PathBuf, TargetError> {
    match processing {
        Processing::Encryption => {
            let mut name = input.as_os_str().to_os_string();
            name.push(FILE_EXTENSION);
            Ok(PathBuf::from(name))
        }
        Processing::Decryption => {
            let name = input.file_name().and_then(OsStr::to_str).ok_or_else(|| TargetError::MissingSuffix(input.to_path_buf()))?;
            let stem_len = name
                .len()
                .checked_sub(FILE_EXTENSION.len())
                .filter(|&at| name.is_char_boundary(at) && name[at..].eq_ignore_ascii_case(FILE_EXTENSION))
                .ok_or_else(|| TargetError::MissingSuffix(input.to_path_buf()))?;

            if stem_len == 0 {
                return Err(TargetError::EmptyName(input.to_path_buf()));
            }

            Ok(input.with_file_name(&name[..stem_len]))
        }
    }
}

/// Resolves one input against an optional explicit output.
pub fn resolve(processing: Processing, input: &Path, explicit_output: Option<&Path>) -> Result<FileJob, TargetError> {
    let known_size = if is_stdio(input) { None } else { Some(input_size(input)?) };

    let output = match explicit_output {
        Some(path) => path.to_path_buf(),
        None => default_output(processing, input)?,
    };

    let remove_on_failure = !is_stdio(&output) && output_is_absent(&output)?;

    Ok(FileJob { input: input.to_path_buf(), output, known_size, remove_on_failure })
}

fn input_size(input: &Path) -> Result<u64, TargetError> {
    match fs::metadata(input) {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(TargetError::NotAFile(input.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(TargetError::NotFound(input.to_path_buf())),
        Err(source) => Err(TargetError::Io { path: input.to_path_buf(), source }),
    }
}

/// Returns whether the output path is free. Existing devices and pipes are
/// accepted as targets but are not considered ours to remove.
fn output_is_absent(output: &Path) -> Result<bool, TargetError> {
    match fs::metadata(output) {
        Ok(meta) if meta.is_dir() => Err(TargetError::OutputIsDirectory(output.to_path_buf())),
        Ok(meta) if meta.is_file() => Err(TargetError::OutputExists(output.to_path_buf())),
        Ok(_) => Ok(false),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(source) => Err(TargetError::Io { path: output.to_path_buf(), source }),
    }
}
