//! Text extraction adapter.
//!
//! [`TextExtractor`] is the seam between the pipeline and the PDF engine. The
//! trait requires `Send + Sync` because workers share one extractor; whether the
//! engine may actually run on several workers at once is decided by
//! [`ExtractorAccess`]:
//!
//! - `Concurrent`: [`PdfTextExtractor`] keeps no shared state between calls, so
//!   every worker extracts in parallel.
//! - `Serialized`: the extractor is wrapped in [`Serialized`], a single lock that
//!   allows one extraction at a time. Use it for engines with global state.
mod cache;
mod pdf;

pub use cache::CachedExtractor;
pub use pdf::PdfTextExtractor;

use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::config::{EncodingMode, ExtractorAccess, ScanConfig};
use crate::errors::ExtractionFailure;
use crate::metrics::PipelineMetrics;

/// Fraction of replacement characters above which fail-fast decoding gives up
pub const MAX_REPLACEMENT_RATIO: f64 = 0.25;

const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Produces plain text for a file, or a typed per-file failure
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractionFailure>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Arc<T> {
    fn extract(&self, path: &Path) -> Result<String, ExtractionFailure> {
        (**self).extract(path)
    }
}

/// Funnels every call through one lock
#[derive(Debug)]
pub struct Serialized<E> {
    inner: E,
    lock: Mutex<()>,
}

impl<E: TextExtractor> Serialized<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

impl<E: TextExtractor> TextExtractor for Serialized<E> {
    fn extract(&self, path: &Path) -> Result<String, ExtractionFailure> {
        // The guarded value is (), so a poisoned lock carries no broken state.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.extract(path)
    }
}

/// Applies the configured access policy to an extractor
pub fn with_access(
    extractor: Arc<dyn TextExtractor>,
    access: ExtractorAccess,
) -> Arc<dyn TextExtractor> {
    match access {
        ExtractorAccess::Concurrent => extractor,
        ExtractorAccess::Serialized => Arc::new(Serialized::new(extractor)),
    }
}

/// Builds the PDF extractor described by `config`
pub fn build_extractor(config: &ScanConfig, metrics: &PipelineMetrics) -> Arc<dyn TextExtractor> {
    let pdf = PdfTextExtractor::new(config.encoding_mode).with_metrics(metrics.clone());
    let base: Arc<dyn TextExtractor> = match &config.cache_dir {
        Some(dir) => Arc::new(CachedExtractor::new(pdf, dir.clone()).with_metrics(metrics.clone())),
        None => Arc::new(pdf),
    };
    with_access(base, config.extractor_access)
}

/// Removes U+FFFD from extracted text, failing when too much of it was lost.
///
/// The error value is a human-readable detail for `EncodingRecoveryFailed`.
pub fn recover_text(text: String, mode: EncodingMode) -> Result<String, String> {
    let replaced = text.chars().filter(|&c| c == REPLACEMENT_CHAR).count();
    if replaced == 0 {
        return Ok(text);
    }

    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    let ratio = replaced as f64 / visible.max(1) as f64;

    if mode == EncodingMode::Failfast && ratio > MAX_REPLACEMENT_RATIO {
        return Err(format!(
            "{} of {} characters were undecodable ({:.0}%)",
            replaced,
            visible,
            ratio * 100.0
        ));
    }

    if mode == EncodingMode::Lossy {
        warn!(
            "Dropping {} undecodable characters ({:.0}%)",
            replaced,
            ratio * 100.0
        );
    }
    Ok(text.replace(REPLACEMENT_CHAR, ""))
}
