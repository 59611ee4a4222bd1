//! Spinners for the slow steps: model loading and index builds.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::display::Theme;

/// Create a spinner for indeterminate progress.
///
/// Drawn on stderr and hidden when stdout is not a terminal, so piped
/// `--json` output stays clean.
pub fn create_spinner(message: &str) -> ProgressBar {
    if !Theme::colors_enabled() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Runs `operation` behind a spinner that is cleared afterwards.
pub fn with_spinner<F, T>(message: &str, operation: F) -> T
where
    F: FnOnce() -> T,
{
    let spinner = create_spinner(message);
    let result = operation();
    spinner.finish_and_clear();
    result
}
