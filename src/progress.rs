//! Progress indicators for sloth CLI.
//!
//! Only commands whose output is captured get a spinner; everything else
//! writes straight to the terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with a message, hidden when `quiet` is set
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Remove the spinner line
pub fn finish(pb: &ProgressBar) {
    pb.finish_and_clear();
}
