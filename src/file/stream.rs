use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};

use crate::config::BUFFERED_IO_SIZE;
use crate::file::FileJob;

pub type InputStream = BufReader<Box<dyn Read + Send>>;
pub type OutputStream = BufWriter<Box<dyn Write + Send>>;

/// Opens the job's input, or standard input for `-`.
#[must_use = "the returned reader should be used to read the input"]
pub fn open_input(job: &FileJob) -> io::Result<InputStream> {
    let source: Box<dyn Read + Send> = if job.reads_stdin() { Box::new(io::stdin()) } else { Box::new(File::open(&job.input)?) };

    Ok(BufReader::with_capacity(BUFFERED_IO_SIZE, source))
}

/// Opens the job's output.
///
/// A path that was free at resolution time is created exclusively, so a file
/// that appeared in the meantime is reported instead of overwritten. Existing
/// devices are opened for writing as they are.
#[must_use = "the returned writer should be used to write the output"]
pub fn open_output(job: &FileJob) -> io::Result<OutputStream> {
    let sink: Box<dyn Write + Send> = if job.writes_stdout() {
        Box::new(io::stdout())
    } else if job.remove_on_failure {
        Box::new(OpenOptions::new().write(true).create_new(true).open(&job.output)?)
    } else {
        Box::new(OpenOptions::new().write(true).open(&job.output)?)
    };

    Ok(BufWriter::with_capacity(BUFFERED_IO_SIZE, sink))
}

/// Removes partial output after a failed or cancelled job.
///
/// Only outputs this run created are eligible, and only while they are still
/// regular files. Returns whether a file was removed.
pub fn discard_output(job: &FileJob) -> io::Result<bool> {
    if !job.remove_on_failure {
        return Ok(false);
    }

    match fs::symlink_metadata(&job.output) {
        Ok(meta) if meta.is_file() => fs::remove_file(&job.output).map(|()| true),
        Ok(_) => Ok(false),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
