//! Terminal progress for a push

use indicatif::{ProgressBar, ProgressStyle};
use mirror_core::{PushProgress, PushedObject};
use std::time::Duration;

/// Spinner that ticks once per pushed object
pub struct SpinnerProgress {
    bar: ProgressBar,
    pushed: u64,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, pushed: 0 }
    }

    /// Hidden spinner, for non-interactive use
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            pushed: 0,
        }
    }

    /// Objects seen so far
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl PushProgress for SpinnerProgress {
    fn on_pushed(&mut self, object: &PushedObject) {
        self.pushed += 1;
        self.bar.set_message(format!(
            "Pushed {} objects (last: {} {})",
            self.pushed, object.kind, object.id
        ));
        self.bar.tick();
    }
}
