use crate::models::PageRecord;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during the extraction process
#[derive(Default)]
pub struct ExtractionStats {
    pub pages_emitted: AtomicU64,
    pub links_emitted: AtomicU64,
    pub empty_titles: AtomicU64,
    pub empty_hashes: AtomicU64,
    pub truncated_pages: AtomicU64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one emitted record and its data-quality gaps.
    pub fn record(&self, record: &PageRecord) {
        self.pages_emitted.fetch_add(1, Ordering::Relaxed);
        self.links_emitted
            .fetch_add(record.links.len() as u64, Ordering::Relaxed);
        if record.title.is_empty() {
            self.empty_titles.fetch_add(1, Ordering::Relaxed);
        }
        if record.hash.is_empty() {
            self.empty_hashes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_truncated(&self) {
        self.truncated_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages(&self) -> u64 {
        self.pages_emitted.load(Ordering::Relaxed)
    }

    pub fn links(&self) -> u64 {
        self.links_emitted.load(Ordering::Relaxed)
    }

    pub fn empty_titles(&self) -> u64 {
        self.empty_titles.load(Ordering::Relaxed)
    }

    pub fn empty_hashes(&self) -> u64 {
        self.empty_hashes.load(Ordering::Relaxed)
    }

    pub fn truncated(&self) -> u64 {
        self.truncated_pages.load(Ordering::Relaxed)
    }
}
