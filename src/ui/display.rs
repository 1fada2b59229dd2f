//! Status lines printed around batch processing.

use std::path::Path;

use bytesize::ByteSize;
use console::style;

use crate::types::Processing;

/// Announces the file about to be processed.
pub fn show_processing(processing: Processing, path: &Path) {
    println!("{}: {}", style(processing.label()).bold(), path.display());
}

/// Printed when a termination request interrupts a running file.
pub fn show_cancelling() {
    eprintln!("{}", style("Request cancelled; cleaning up...").yellow());
}

pub fn show_summary(processing: Processing, files: usize, bytes: u64) {
    println!("{} {} {} file(s), {}", style("✓").green(), processing.past(), files, ByteSize::b(bytes));
}

pub fn show_warning(message: &str) {
    eprintln!("{} {}", style("warning:").yellow().bold(), message);
}

pub fn show_error(message: &str) {
    eprintln!("{} {}", style("error:").red().bold(), message);
}
