use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use clap::{ArgGroup, Parser};
use tracing::{debug, info};

use crate::config::{
    APP_NAME, APP_VERSION, CREATED_BY_EXTENSION, KDF_DEFAULT_ITERATIONS, KDF_MAX_ITERATIONS, KDF_MIN_ITERATIONS, KEY_FILE_DEFAULT_SIZE, KEY_FILE_MAX_SIZE, KEY_FILE_MIN_SIZE,
};
use crate::control::{ProcessControl, spawn_signal_listener};
use crate::engine::{AesEngine, Extension};
use crate::file::is_stdio;
use crate::key::{KeyMaterial, TtyReader, generate_key_file, prompt_for_key, read_key_file};
use crate::processor::{BatchProcessor, BatchSettings};
use crate::types::{Mode, Processing};
use crate::ui;

#[derive(Parser, Debug)]
#[command(
    name = "aesbatch",
    about = "Encrypt and decrypt files with AES-256-GCM, using a password or a key file.",
    disable_version_flag = true,
    group(ArgGroup::new("mode").args(["encrypt", "decrypt", "generate"]))
)]
pub struct App {
    /// Encrypt the given files
    #[arg(short, long)]
    encrypt: bool,

    /// Decrypt the given files
    #[arg(short, long)]
    decrypt: bool,

    /// Generate a key file (requires --keyfile)
    #[arg(short, long)]
    generate: bool,

    /// Password to use; prompted for when neither this nor --keyfile is given
    #[arg(short, long)]
    password: Option<OsString>,

    /// Key file to read the password from, or to write when generating
    #[arg(short, long)]
    keyfile: Option<PathBuf>,

    /// KDF iterations when encrypting
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(i64::from(KDF_MIN_ITERATIONS)..=i64::from(KDF_MAX_ITERATIONS)))]
    iterations: Option<u32>,

    /// Size in octets of a generated key file
    #[arg(short = 's', long, value_parser = clap::value_parser!(u16).range(i64::from(KEY_FILE_MIN_SIZE)..=i64::from(KEY_FILE_MAX_SIZE)))]
    keysize: Option<u16>,

    /// Output file; only valid with a single input
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Suppress status output and the progress meter
    #[arg(short, long)]
    quiet: bool,

    /// Write debug logs to standard error (implies --quiet)
    #[arg(short, long)]
    logging: bool,

    /// Print version information
    #[arg(short = 'v', long)]
    version: bool,

    /// Files to process; `-` reads standard input
    files: Vec<PathBuf>,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        if app.logging {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_max_level(tracing::Level::DEBUG)
                .with_file(true)
                .with_line_number(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }

        Ok(app)
    }

    pub async fn execute(mut self) -> Result<()> {
        if self.version {
            println!("{APP_NAME} {APP_VERSION}");
            return Ok(());
        }

        let mode = self.validate()?;
        debug!(%mode, files = self.files.len(), "arguments accepted");

        match mode.processing() {
            Some(processing) => self.run_batch(processing).await,
            None => self.run_generate(),
        }
    }

    /// Checks argument combinations before any file is touched.
    fn validate(&self) -> Result<Mode> {
        let mode = match (self.encrypt, self.decrypt, self.generate) {
            (true, false, false) => Mode::Encrypt,
            (false, true, false) => Mode::Decrypt,
            (false, false, true) => Mode::Generate,
            _ => bail!("exactly one of --encrypt, --decrypt or --generate must be given"),
        };

        ensure!(self.files.iter().filter(|file| is_stdio(file)).count() <= 1, "standard input (-) may be named only once");

        if mode == Mode::Generate {
            ensure!(self.files.is_empty(), "input files cannot be given when generating a key file");
            ensure!(self.password.is_none(), "a password cannot be given when generating a key file");
            ensure!(self.outfile.is_none(), "--outfile cannot be used when generating a key file");
            ensure!(self.keyfile.is_some(), "--keyfile is required when generating a key file");
        } else {
            ensure!(!self.files.is_empty(), "no input files were given");
            ensure!(!self.keyfile.as_deref().is_some_and(is_stdio), "the key file cannot be read from standard input when encrypting or decrypting");
            ensure!(self.keysize.is_none(), "--keysize is only valid when generating a key file");
        }

        if let Some(password) = &self.password {
            ensure!(self.keyfile.is_none(), "--password and --keyfile cannot be used together");
            ensure!(!password.is_empty(), "the password must not be empty");
        }
        ensure!(!self.keyfile.as_deref().is_some_and(|path| path.as_os_str().is_empty()), "the key file name must not be empty");

        if let Some(outfile) = &self.outfile {
            ensure!(self.files.len() <= 1, "--outfile can only be used with a single input file");
            ensure!(!outfile.as_os_str().is_empty(), "the output file name must not be empty");
        } else {
            ensure!(!self.files.iter().any(|file| is_stdio(file)), "--outfile is required when reading from standard input");
        }

        if self.iterations.is_some() && mode != Mode::Encrypt {
            ui::show_warning("--iterations only applies when encrypting and will be ignored");
        }

        Ok(mode)
    }

    fn run_generate(&self) -> Result<()> {
        let path = self.keyfile.as_deref().context("--keyfile is required when generating a key file")?;
        let octets = self.keysize.unwrap_or(KEY_FILE_DEFAULT_SIZE);

        generate_key_file(path, usize::from(octets))?;
        info!(path = %path.display(), octets, "key file generated");

        Ok(())
    }

    async fn run_batch(&mut self, processing: Processing) -> Result<()> {
        let key = self.take_key(processing)?;

        // Not before the prompt: an interrupt while prompting must still end the process.
        let control = Arc::new(ProcessControl::new());
        spawn_signal_listener(Arc::clone(&control)).context("unable to install signal handlers")?;

        let quiet = self.quiet || self.logging;
        let settings = BatchSettings {
            processing,
            iterations: self.iterations.unwrap_or(KDF_DEFAULT_ITERATIONS),
            quiet,
            extensions: vec![Extension::new(CREATED_BY_EXTENSION, format!("{APP_NAME} {APP_VERSION}"))],
            output: self.outfile.clone(),
        };
        let to_stdout = settings.output.as_deref().is_some_and(is_stdio);
        let inputs = std::mem::take(&mut self.files);

        let report = tokio::task::spawn_blocking(move || {
            let secret = key.into_secret();
            BatchProcessor::new(control, settings).run::<AesEngine>(&secret, &inputs)
        })
        .await
        .context("batch worker stopped unexpectedly")??;

        if !quiet && !to_stdout {
            ui::show_summary(processing, report.files, report.bytes);
        }

        Ok(())
    }

    /// Obtains the secret from the one source the arguments name.
    fn take_key(&mut self, processing: Processing) -> Result<KeyMaterial> {
        if let Some(password) = self.password.take() {
            return Ok(KeyMaterial::from_password(password.into_encoded_bytes())?);
        }

        if let Some(path) = self.keyfile.as_deref() {
            return Ok(read_key_file(path)?);
        }

        Ok(prompt_for_key(&mut TtyReader, processing == Processing::Encryption)?)
    }
}
