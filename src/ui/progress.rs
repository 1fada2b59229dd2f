use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::METER_WIDTH;

/// Byte progress bar for a single file, drawn on standard output.
pub struct Meter {
    bar: ProgressBar,
}

impl Meter {
    /// Creates a meter for `total` bytes; a hidden one when `enabled` is false.
    pub fn new(total: u64, description: &str, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: ProgressBar::hidden() };
        }

        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stdout());
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("●○ ");

        bar.set_style(style);
        bar.set_message(description.to_string());

        Self { bar }
    }

    /// Bytes between two meter updates for an input of `size` bytes.
    ///
    /// Zero means the meter stays off: the size is unknown, or the input is
    /// too small for a meter to be worth drawing.
    pub fn stride_for(size: Option<u64>) -> u64 {
        let Some(size) = size else { return 0 };

        let stride = size / METER_WIDTH;
        if stride < METER_WIDTH * 16 { 0 } else { stride }
    }

    /// A cloneable handle the engine callback can move to the worker thread.
    pub fn handle(&self) -> ProgressBar {
        self.bar.clone()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Stops drawing and leaves the bar where it stopped.
    pub fn stop(&self) {
        self.bar.abandon();
    }
}

impl Drop for Meter {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
