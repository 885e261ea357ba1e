use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the rounds of a sweep. Rounds are the deployment of a sweep value and each
/// base URL change that follows it.
pub(crate) struct SweepProgress {
    bar: ProgressBar,
}

impl SweepProgress {
    pub(crate) fn start(total_rounds: u64, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_rounds);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} rounds [{elapsed_precise}] {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_secs(1));

        Self { bar }
    }

    pub(crate) fn set_message(&self, message: String) {
        self.bar.set_message(message);
    }

    pub(crate) fn round_complete(&self) {
        self.bar.inc(1);
    }

    pub(crate) fn finish(&self) {
        log::trace!("Sweep progress finished at {}", self.bar.position());
        self.bar.finish_and_clear();
    }
}
