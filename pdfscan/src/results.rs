//! Result types produced by the pipeline and its consumers.
//!
//! Workers create [`Document`]s and hand each one off exactly once; after that
//! the consumer owns it. Derived values ([`SearchMatch`], [`RankedDocument`]) are
//! built by the consumers and are read-only afterwards.
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ExtractionFailure;

/// One successfully extracted PDF and its derived counts
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    /// Extracted plain text
    pub text: String,
    pub token_count: usize,
    /// Occurrences per configured keyword, in caller order, zero-filled
    pub keyword_counts: IndexMap<String, usize>,
}

impl Document {
    /// File name used in extraction blocks and reports
    pub fn name(&self) -> Cow<'_, str> {
        display_name(&self.path)
    }

    /// Occurrences of `keyword`, zero when it was not configured
    pub fn count(&self, keyword: &str) -> usize {
        self.keyword_counts.get(keyword).copied().unwrap_or(0)
    }
}

pub(crate) fn display_name(path: &Path) -> Cow<'_, str> {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy())
}

/// What a worker emits for each submitted path
pub type FileOutcome = Result<Document, ExtractionFailure>;

/// A document containing the search phrase at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub path: PathBuf,
    /// Always >= 1
    pub occurrence_count: usize,
    /// Normalized text around the first few occurrences
    pub snippets: Vec<String>,
}

/// A document and its relevance score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    pub path: PathBuf,
    pub score: f64,
}

/// Success/failure accounting for one batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Failure records in completion order, skipped files included
    pub failures: Vec<ExtractionFailure>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, failure: ExtractionFailure) {
        if failure.is_skipped() {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }
        self.failures.push(failure);
    }

    /// Tallies an outcome without taking the document
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            Ok(_) => self.record_success(),
            Err(failure) => self.record_failure(failure.clone()),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Merges another summary into this one
    pub fn merge(&mut self, other: BatchSummary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
        self.elapsed += other.elapsed;
    }
}

/// Outcome of a phrase search
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReport {
    pub phrase: String,
    /// Matches in the order documents finished processing
    pub matches: Vec<SearchMatch>,
    pub total_occurrences: usize,
    pub documents_searched: usize,
    pub summary: BatchSummary,
}

impl SearchReport {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            ..Default::default()
        }
    }

    pub fn add_match(&mut self, m: SearchMatch) {
        self.total_occurrences += m.occurrence_count;
        self.matches.push(m);
    }

    pub fn matched_paths(&self) -> Vec<PathBuf> {
        self.matches.iter().map(|m| m.path.clone()).collect()
    }

    pub fn files_with_matches(&self) -> usize {
        self.matches.len()
    }
}
