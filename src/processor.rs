//! Batch encryption and decryption.
//!
//! Files are processed one at a time, in order. The first failure or
//! cancellation ends the batch; output that was being written for that file
//! is removed if this run created it, and later files are left untouched.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::control::ProcessControl;
use crate::engine::{Engine, Extension, ProgressSink};
use crate::error::BatchError;
use crate::file::{FileJob, InputStream, OutputStream, check_batch, discard_output, open_input, open_output, resolve};
use crate::secret::SecretBuffer;
use crate::types::Processing;
use crate::ui::{self, Meter};
use crate::worker::{CancellableWorker, Outcome};

/// Everything a batch needs besides the secret and the file list.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub processing: Processing,
    /// KDF iterations; only used when encrypting.
    pub iterations: u32,
    pub quiet: bool,
    pub extensions: Vec<Extension>,
    /// Explicit output, valid only for a single input.
    pub output: Option<PathBuf>,
}

/// Totals for a batch that ran to completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub files: usize,
    pub bytes: u64,
}

pub struct BatchProcessor {
    control: Arc<ProcessControl>,
    settings: BatchSettings,
}

impl BatchProcessor {
    pub fn new(control: Arc<ProcessControl>, settings: BatchSettings) -> Self {
        Self { control, settings }
    }

    /// Processes `inputs` in order with a fresh `E` per file.
    pub fn run<E: Engine + Default>(&self, secret: &SecretBuffer, inputs: &[PathBuf]) -> Result<BatchReport, BatchError> {
        let processing = self.settings.processing;
        check_batch(processing, inputs, self.settings.output.as_deref())?;

        let mut report = BatchReport::default();
        for input in inputs {
            let job = resolve(processing, input, self.settings.output.as_deref())?;
            let bytes = self.process::<E>(secret, &job)?;

            report.files += 1;
            report.bytes += bytes;

            if self.control.terminate_requested() {
                info!("termination requested, stopping after {}", job.input.display());
                return Err(BatchError::Terminated);
            }
        }

        Ok(report)
    }

    fn process<E: Engine + Default>(&self, secret: &SecretBuffer, job: &FileJob) -> Result<u64, BatchError> {
        let input = open_input(job).map_err(|source| BatchError::OpenInput { path: job.input.clone(), source })?;
        // An output that could not be opened was never created by this run.
        let output = open_output(job).map_err(|source| BatchError::OpenOutput { path: job.output.clone(), source })?;

        let result = self.execute::<E>(secret, job, input, output);

        if result.is_err() {
            match discard_output(job) {
                Ok(true) => debug!(output = %job.output.display(), "removed partial output"),
                Ok(false) => {}
                Err(e) => warn!(output = %job.output.display(), error = %e, "unable to remove partial output"),
            }
        }

        result
    }

    fn execute<E: Engine + Default>(&self, secret: &SecretBuffer, job: &FileJob, mut input: InputStream, mut output: OutputStream) -> Result<u64, BatchError> {
        let processing = self.settings.processing;

        let visible = !self.settings.quiet && !job.writes_stdout();
        if visible {
            ui::show_processing(processing, &job.input);
        }

        let stride = if visible { Meter::stride_for(job.known_size) } else { 0 };
        let meter = Meter::new(job.known_size.unwrap_or(0), processing.label(), stride > 0);
        let bar = meter.handle();
        let mut progress = if stride > 0 { ProgressSink::new(stride, move |offset| bar.set_position(offset)) } else { ProgressSink::disabled() };

        info!(input = %job.input.display(), output = %job.output.display(), size = ?job.known_size, "{processing} file");

        let engine = E::default();
        let settings = &self.settings;
        let outcome = CancellableWorker::new(&self.control).run(
            || match processing {
                Processing::Encryption => engine.encrypt(secret, settings.iterations, &settings.extensions, &mut input, &mut output, &mut progress),
                Processing::Decryption => engine.decrypt(secret, &mut input, &mut output, &mut progress),
            },
            || {
                meter.stop();
                ui::show_cancelling();
                engine.cancel();
            },
        );
        drop(input);

        match outcome {
            Outcome::Completed => {}
            Outcome::Cancelled => return Err(BatchError::Cancelled),
            Outcome::Failed(source) => return Err(BatchError::Engine { processing, path: job.input.clone(), source }),
        }

        output.flush().map_err(|source| BatchError::Flush { path: job.output.clone(), source })?;
        drop(output);
        meter.finish();

        debug!(input = %job.input.display(), bytes = progress.consumed(), "file done");
        Ok(progress.consumed())
    }
}
