pub mod display;
pub mod progress;

pub use display::{show_cancelling, show_error, show_processing, show_summary, show_warning};
pub use progress::Meter;
