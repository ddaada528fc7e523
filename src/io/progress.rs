//! Progress reporting for batch pipeline phases

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static PHASE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg:>10} [{bar:30.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Coordinates progress display across the ingest/assign/render phases
///
/// One bar is active at a time; finished phases keep their final line so
/// the run reads as a log of completed stages.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    current: Option<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            current: None,
        }
    }

    /// Start a new phase with the given label and step count
    pub fn begin_phase(&mut self, label: &'static str, steps: usize) {
        let bar = ProgressBar::new(steps as u64);
        bar.set_style(PHASE_STYLE.clone());
        bar.set_message(label);
        self.current = Some(self.multi_progress.add(bar));
    }

    /// Advance the active phase by one step
    pub fn step(&self) {
        if let Some(ref bar) = self.current {
            bar.inc(1);
        }
    }

    /// Finish the active phase, replacing its line with a summary
    pub fn finish_phase(&mut self, summary: String) {
        if let Some(bar) = self.current.take() {
            bar.finish_with_message(summary);
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        let _ = self.multi_progress.clear();
    }
}
