//! Progress feedback while waiting on the analysis service
//!
//! Backtests run remotely and can take a while; a spinner keeps the
//! terminal alive in the meantime using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

const TICKS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner for a single remote request
pub struct Spinner {
    pub spinner: ProgressBar,
    started: Instant,
}

impl Spinner {
    /// Create a new spinner
    pub fn new(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&TICKS);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(message.to_string());

        Self {
            spinner,
            started: Instant::now(),
        }
    }

    /// Spinner that never draws, for `--json` output and tests
    pub fn hidden() -> Self {
        Self {
            spinner: ProgressBar::hidden(),
            started: Instant::now(),
        }
    }

    /// Update spinner message
    pub fn update(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Finish spinner with success
    pub fn finish(&self, message: &str) {
        self.spinner.finish_with_message(format!(
            "✅ {} ({:.1}s)",
            message,
            self.elapsed().as_secs_f64()
        ));
    }

    /// Finish spinner with error
    pub fn finish_with_error(&self, message: &str) {
        self.spinner.finish_with_message(format!("❌ {}", message));
    }
}
