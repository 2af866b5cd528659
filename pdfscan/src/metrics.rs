use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::ErrorKind;

/// Lock-free counters shared by every worker of a run
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    files_submitted: Arc<AtomicU64>,
    documents_extracted: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    files_skipped: Arc<AtomicU64>,

    bytes_read: Arc<AtomicU64>,
    chars_extracted: Arc<AtomicU64>,
    tokens_scored: Arc<AtomicU64>,

    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            files_submitted: Arc::new(AtomicU64::new(0)),
            documents_extracted: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            files_skipped: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            chars_extracted: Arc::new(AtomicU64::new(0)),
            tokens_scored: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_submitted(&self, files: u64) {
        self.files_submitted.fetch_add(files, Ordering::Relaxed);
    }

    /// Records a document that made it through extraction and scoring
    pub fn record_document(&self, chars: u64, tokens: u64) {
        self.documents_extracted.fetch_add(1, Ordering::Relaxed);
        self.chars_extracted.fetch_add(chars, Ordering::Relaxed);
        self.tokens_scored.fetch_add(tokens, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        if kind == ErrorKind::Skipped {
            self.files_skipped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_bytes_read(&self, bytes: u64) {
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        debug!("Read {} bytes, total: {} bytes", bytes, total);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            files_submitted: self.files_submitted.load(Ordering::Relaxed),
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            chars_extracted: self.chars_extracted.load(Ordering::Relaxed),
            tokens_scored: self.tokens_scored.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Pipeline stats:\n\
             Files submitted: {}\n\
             Documents extracted/failed/skipped: {}/{}/{}\n\
             Bytes read: {}\n\
             Characters extracted: {}\n\
             Tokens scored: {}\n\
             Text cache hits/misses: {}/{}",
            stats.files_submitted,
            stats.documents_extracted,
            stats.files_failed,
            stats.files_skipped,
            stats.bytes_read,
            stats.chars_extracted,
            stats.tokens_scored,
            stats.cache_hits,
            stats.cache_misses
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub files_submitted: u64,
    pub documents_extracted: u64,
    pub files_failed: u64,
    pub files_skipped: u64,
    pub bytes_read: u64,
    pub chars_extracted: u64,
    pub tokens_scored: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_and_failure_tracking() {
        let metrics = PipelineMetrics::new();
        metrics.record_submitted(4);
        metrics.record_document(120, 20);
        metrics.record_document(80, 10);
        metrics.record_failure(ErrorKind::UnsupportedOrCorrupted);
        metrics.record_failure(ErrorKind::Skipped);

        let stats = metrics.get_stats();
        assert_eq!(stats.files_submitted, 4);
        assert_eq!(stats.documents_extracted, 2);
        assert_eq!(stats.chars_extracted, 200);
        assert_eq!(stats.tokens_scored, 30);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_skipped, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = PipelineMetrics::new();
        let worker_view = metrics.clone();

        worker_view.record_bytes_read(1000);
        worker_view.record_cache_lookup(true);
        worker_view.record_cache_lookup(false);

        let stats = metrics.get_stats();
        assert_eq!(stats.bytes_read, 1000);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }
}
