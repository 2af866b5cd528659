//! The three user-facing operations, wired end to end.
//!
//! Each operation discovers PDFs under its inputs, runs them through a
//! [`WorkerPool`], and hands the result stream to its consumer:
//!
//! - `extract`: every document is written as a delimited block to one file
//! - `search`: a [`SearchAggregator`] collects phrase matches
//! - `analyze`: keyword vectors are reduced into a correlation matrix and ranking
//!
//! Per-file failures are tallied in the operation's [`BatchSummary`]; only
//! configuration, discovery and output problems return an error.
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::{self, AnalysisReport, KeywordSet};
use crate::archive::{default_archive_name, ArchiveWriter, ZipArchiveWriter};
use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use crate::extract::{build_extractor, with_access, TextExtractor};
use crate::filters::collect_pdf_paths;
use crate::metrics::PipelineMetrics;
use crate::pipeline::{CancellationToken, ResultStream, WorkerPool};
use crate::report::ExtractionWriter;
use crate::results::{BatchSummary, Document, SearchReport};
use crate::search::{PhraseMatcher, SearchAggregator, SearchOptions};

pub struct Engine {
    config: ScanConfig,
    extractor: Arc<dyn TextExtractor>,
    metrics: PipelineMetrics,
    cancel: CancellationToken,
}

impl Engine {
    /// Validates `config` and builds the PDF extractor it describes
    pub fn new(config: ScanConfig) -> ScanResult<Self> {
        config.validate()?;
        let metrics = PipelineMetrics::new();
        let extractor = build_extractor(&config, &metrics);
        Ok(Self {
            config,
            extractor,
            metrics,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the extractor, keeping the configured access policy
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = with_access(extractor, self.config.extractor_access);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Token that stops every operation run by this engine
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Extracts every PDF under `inputs` into `output`
    pub fn extract_to_file(&self, inputs: &[PathBuf], output: &Path) -> ScanResult<BatchSummary> {
        let start = Instant::now();
        let paths = self.discover(inputs)?;
        info!("Extracting {} PDF files into {}", paths.len(), output.display());

        let mut writer = ExtractionWriter::new(BufWriter::new(File::create(output)?));
        let mut summary = BatchSummary::new();
        let progress = self.progress_bar(paths.len(), "Extracting text");

        for outcome in self.run_pool(paths, KeywordSet::empty())? {
            progress.inc(1);
            summary.record(&outcome);
            if let Ok(document) = outcome {
                writer.write_document(&document)?;
            }
        }
        writer.finish()?;
        progress.finish_and_clear();

        summary.elapsed = start.elapsed();
        self.metrics.log_stats();
        info!(
            "Wrote {} documents to {}",
            summary.succeeded,
            output.display()
        );
        Ok(summary)
    }

    /// Searches every PDF under `roots` (the home directory when empty)
    pub fn search(&self, phrase: &str, roots: &[PathBuf], regex: bool) -> ScanResult<SearchReport> {
        let start = Instant::now();
        let matcher = if regex {
            PhraseMatcher::regex(phrase)?
        } else {
            PhraseMatcher::literal(phrase)?
        };

        let roots = if roots.is_empty() {
            default_search_roots()?
        } else {
            roots.to_vec()
        };
        let paths = self.discover(&roots)?;
        info!("Searching {} PDF files for \"{}\"", paths.len(), phrase);

        let progress = self.progress_bar(paths.len(), "Searching");
        let mut aggregator = SearchAggregator::new(&matcher, SearchOptions::from(&self.config));
        for outcome in self.run_pool(paths, KeywordSet::empty())? {
            progress.inc(1);
            aggregator.push(outcome);
        }
        progress.finish_and_clear();

        let mut report = aggregator.finish();
        report.summary.elapsed = start.elapsed();
        self.metrics.log_stats();
        info!(
            "Found {} occurrences in {} files",
            report.total_occurrences,
            report.files_with_matches()
        );
        Ok(report)
    }

    /// Zips the matching files of `report`; `None` when nothing matched
    pub fn bundle(&self, report: &SearchReport, output: Option<&Path>) -> ScanResult<Option<PathBuf>> {
        self.bundle_with(&ZipArchiveWriter::new(), report, output)
    }

    pub fn bundle_with(
        &self,
        writer: &dyn ArchiveWriter,
        report: &SearchReport,
        output: Option<&Path>,
    ) -> ScanResult<Option<PathBuf>> {
        if report.matches.is_empty() {
            debug!("No matches, no archive written");
            return Ok(None);
        }
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_archive_name(Utc::now()));
        writer.write_archive(&output, &report.matched_paths())?;
        Ok(Some(output))
    }

    /// Correlates `keywords` across every PDF under `inputs` and ranks the documents
    pub fn analyze(&self, inputs: &[PathBuf], keywords: &[String]) -> ScanResult<AnalysisReport> {
        let start = Instant::now();
        let keywords = KeywordSet::new(keywords);
        keywords.require_non_empty()?;

        let paths = self.discover(inputs)?;
        info!(
            "Analyzing {} PDF files for {} keywords",
            paths.len(),
            keywords.len()
        );

        let progress = self.progress_bar(paths.len(), "Analyzing");
        let mut summary = BatchSummary::new();
        let mut documents: Vec<Document> = Vec::new();
        for outcome in self.run_pool(paths, keywords.clone())? {
            progress.inc(1);
            summary.record(&outcome);
            if let Ok(document) = outcome {
                // Only the counts are needed from here on.
                documents.push(Document {
                    text: String::new(),
                    ..document
                });
            }
        }
        progress.finish_and_clear();

        let mut report = analysis::analyze(
            &documents,
            &keywords,
            self.config.threshold,
            self.config.ranking,
        )?;
        summary.elapsed = start.elapsed();
        report.summary = summary;

        self.metrics.log_stats();
        info!(
            "Analysis finished: {} documents, {} significant pairs",
            report.documents_analyzed,
            report.significant_pairs.len()
        );
        Ok(report)
    }

    fn discover(&self, inputs: &[PathBuf]) -> ScanResult<Vec<PathBuf>> {
        let paths = collect_pdf_paths(
            inputs,
            &self.config.file_extensions,
            &self.config.ignore_patterns,
        );
        if paths.is_empty() {
            return Err(ScanError::NoInputFiles);
        }
        Ok(paths)
    }

    fn run_pool(&self, paths: Vec<PathBuf>, keywords: KeywordSet) -> ScanResult<ResultStream> {
        WorkerPool::from_config(&self.config, Arc::clone(&self.extractor), keywords)
            .with_cancellation(self.cancel.clone())
            .with_metrics(self.metrics.clone())
            .run(paths)
    }

    fn progress_bar(&self, len: usize, message: &'static str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(message);
        bar
    }
}

/// Where `search` looks when no directories are given
pub fn default_search_roots() -> ScanResult<Vec<PathBuf>> {
    dirs::home_dir()
        .map(|home| vec![home])
        .ok_or_else(|| ScanError::config_error("No directories given and no home directory found"))
}
