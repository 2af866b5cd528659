//! Phrase search over extracted documents.
//!
//! The aggregator consumes the pool's result stream as it completes, so output
//! order is completion order. Failures pass through into the report's
//! [`BatchSummary`](crate::results::BatchSummary); only successfully extracted
//! documents are searched.
//!
//! ```rust,ignore
//! let matcher = PhraseMatcher::literal("quarterly report")?;
//! let report = search(pool.run(paths)?, &matcher, &SearchOptions::default());
//! for m in &report.matches {
//!     println!("{}: {}", m.path.display(), m.occurrence_count);
//! }
//! ```
pub mod matcher;

pub use matcher::{normalize_text, PhraseMatcher};

use tracing::{debug, trace};

use crate::config::ScanConfig;
use crate::results::{Document, FileOutcome, SearchMatch, SearchReport};

/// How much context to keep around each hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub context_chars: usize,
    pub max_snippets: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            context_chars: 40,
            max_snippets: 3,
        }
    }
}

impl From<&ScanConfig> for SearchOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            context_chars: config.context_chars,
            max_snippets: config.max_snippets,
        }
    }
}

/// Finds the phrase in one document, `None` when it does not occur
pub fn match_document(
    document: &Document,
    matcher: &PhraseMatcher,
    options: &SearchOptions,
) -> Option<SearchMatch> {
    let normalized = normalize_text(&document.text);
    let hits = matcher.find_matches(&normalized);
    if hits.is_empty() {
        return None;
    }

    let snippets = hits
        .iter()
        .take(options.max_snippets)
        .map(|&(start, end)| matcher::snippet(&normalized, start, end, options.context_chars))
        .collect();

    Some(SearchMatch {
        path: document.path.clone(),
        occurrence_count: hits.len(),
        snippets,
    })
}

/// Accumulates matches and failures from a result stream
#[derive(Debug)]
pub struct SearchAggregator<'a> {
    matcher: &'a PhraseMatcher,
    options: SearchOptions,
    report: SearchReport,
}

impl<'a> SearchAggregator<'a> {
    pub fn new(matcher: &'a PhraseMatcher, options: SearchOptions) -> Self {
        Self {
            matcher,
            options,
            report: SearchReport::new(matcher.phrase()),
        }
    }

    /// Takes one outcome; the document text is dropped once searched
    pub fn push(&mut self, outcome: FileOutcome) {
        self.report.summary.record(&outcome);
        match outcome {
            Ok(document) => {
                self.report.documents_searched += 1;
                match match_document(&document, self.matcher, &self.options) {
                    Some(found) => {
                        debug!(
                            "Found {} occurrence(s) in {}",
                            found.occurrence_count,
                            document.path.display()
                        );
                        self.report.add_match(found);
                    }
                    None => trace!("No match in {}", document.path.display()),
                }
            }
            Err(failure) => trace!("Not searching {}: {}", failure.path.display(), failure.cause),
        }
    }

    pub fn finish(self) -> SearchReport {
        self.report
    }
}

/// Searches every outcome in `results`
pub fn search<I>(results: I, matcher: &PhraseMatcher, options: &SearchOptions) -> SearchReport
where
    I: IntoIterator<Item = FileOutcome>,
{
    let mut aggregator = SearchAggregator::new(matcher, *options);
    for outcome in results {
        aggregator.push(outcome);
    }
    aggregator.finish()
}
