use crate::config::{MILESTONE_INTERVAL, PROGRESS_INTERVAL};
use crate::models::PageRecord;
use crate::stats::ExtractionStats;
use indicatif::ProgressBar;
use std::time::{Duration, Instant};
use tracing::info;

/// Hook points the extraction loop calls; the loop itself never prints.
pub trait ExtractionObserver {
    /// Called after each record is written. `emitted` counts records so far, this one included.
    fn page_completed(&self, _record: &PageRecord, _emitted: u64) {}

    /// Called once after the output has been flushed.
    fn run_finished(&self, _stats: &ExtractionStats, _elapsed: Duration) {}
}

/// Observer that does nothing.
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Spinner plus a milestone log line every million pages.
pub struct ProgressObserver {
    pb: ProgressBar,
    started: Instant,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    /// Uses a caller-supplied bar (hidden bars keep tests quiet).
    pub fn with_bar(pb: ProgressBar) -> Self {
        Self {
            pb,
            started: Instant::now(),
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionObserver for ProgressObserver {
    fn page_completed(&self, _record: &PageRecord, emitted: u64) {
        if emitted % PROGRESS_INTERVAL == 0 {
            self.pb.set_message(format!("{} pages", emitted));
            self.pb.tick();
        }
        if emitted % MILESTONE_INTERVAL == 0 {
            info!(
                millions = emitted / MILESTONE_INTERVAL,
                elapsed_secs = self.started.elapsed().as_secs_f64(),
                "Extraction milestone"
            );
        }
    }

    fn run_finished(&self, stats: &ExtractionStats, elapsed: Duration) {
        self.pb.finish_and_clear();
        info!(
            pages = stats.pages(),
            links = stats.links(),
            duration_secs = elapsed.as_secs_f64(),
            "Extraction finished"
        );
    }
}
