use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::trace;

use super::{recover_text, TextExtractor};
use crate::config::EncodingMode;
use crate::errors::ExtractionFailure;
use crate::metrics::PipelineMetrics;

/// Bytes searched for the `%PDF-` marker before giving up on a file
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Whole-document text extraction backed by `pdf-extract`.
///
/// Each call reads the file into memory and parses it independently; there is
/// no state shared between calls, so one instance serves all workers.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor {
    encoding_mode: EncodingMode,
    metrics: Option<PipelineMetrics>,
}

impl PdfTextExtractor {
    pub fn new(encoding_mode: EncodingMode) -> Self {
        Self {
            encoding_mode,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// True when the `%PDF-` marker appears near the start of `bytes`
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionFailure> {
        let bytes = std::fs::read(path).map_err(|e| ExtractionFailure::from_io(path, &e))?;
        if let Some(metrics) = &self.metrics {
            metrics.record_bytes_read(bytes.len() as u64);
        }

        if !has_pdf_header(&bytes) {
            return Err(ExtractionFailure::corrupted(path, "missing %PDF header"));
        }

        trace!("Extracting text from {}", path.display());

        // Malformed font programs can make the engine panic; contain that to this file.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }));

        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(ExtractionFailure::corrupted(path, e.to_string())),
            Err(_) => {
                return Err(ExtractionFailure::corrupted(
                    path,
                    "PDF engine panicked while parsing the document",
                ))
            }
        };

        recover_text(text, self.encoding_mode)
            .map_err(|detail| ExtractionFailure::encoding(path, detail))
    }
}
