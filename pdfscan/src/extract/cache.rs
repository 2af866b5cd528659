use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

use super::TextExtractor;
use crate::errors::ExtractionFailure;
use crate::metrics::PipelineMetrics;

/// Reuses previously extracted text while the source file is unchanged.
///
/// Entries are named `<stem>-<path hash>-<size>-<mtime>.txt`, so a modified
/// file simply misses the cache and same-named files in different directories
/// never share an entry. Only successful extractions are stored. A cache that cannot
/// be read or written never fails a file.
#[derive(Debug)]
pub struct CachedExtractor<E> {
    inner: E,
    cache_dir: PathBuf,
    metrics: Option<PipelineMetrics>,
}

impl<E: TextExtractor> CachedExtractor<E> {
    pub fn new(inner: E, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Cache file for `path`, or `None` when its signature cannot be read
    pub fn entry_path(&self, path: &Path) -> Option<PathBuf> {
        let metadata = fs::metadata(path).ok()?;
        let mtime = metadata
            .modified()
            .ok()?
            .duration_since(UNIX_EPOCH)
            .ok()?
            .as_nanos();
        let stem = path.file_stem()?.to_string_lossy();
        let canonical = path.canonicalize().ok()?;
        Some(self.cache_dir.join(format!(
            "{}-{}-{}-{}.txt",
            stem,
            path_digest(&canonical),
            metadata.len(),
            mtime
        )))
    }

    fn record_lookup(&self, hit: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(hit);
        }
    }

    fn store(&self, entry: &Path, text: &str) {
        if let Err(e) = fs::create_dir_all(&self.cache_dir).and_then(|_| fs::write(entry, text)) {
            warn!("Could not write text cache {}: {}", entry.display(), e);
        }
    }
}

/// First 16 hex digits of the SHA-256 of the full path
fn path_digest(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(16);
    digest
}

impl<E: TextExtractor> TextExtractor for CachedExtractor<E> {
    fn extract(&self, path: &Path) -> Result<String, ExtractionFailure> {
        let entry = self.entry_path(path);

        if let Some(entry) = &entry {
            if let Ok(text) = fs::read_to_string(entry) {
                debug!("Text cache hit for {}", path.display());
                self.record_lookup(true);
                return Ok(text);
            }
        }
        self.record_lookup(false);

        let text = self.inner.extract(path)?;
        if let Some(entry) = &entry {
            self.store(entry, &text);
        }
        Ok(text)
    }
}
