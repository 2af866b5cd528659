//! Rendering of operation results.
//!
//! Extraction output is a stream of delimited blocks written as documents
//! complete. Search and analysis reports render to text or JSON.
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

use crate::analysis::AnalysisReport;
use crate::errors::ScanResult;
use crate::results::{display_name, BatchSummary, Document, SearchReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Writes `[Start of document: name]` / `[End of document: name]` blocks
#[derive(Debug)]
pub struct ExtractionWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> ExtractionWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Appends one block; blocks are separated by a blank line
    pub fn write_document(&mut self, document: &Document) -> ScanResult<()> {
        let name = document.name();
        if self.written > 0 {
            self.out.write_all(b"\n")?;
        }
        write!(
            self.out,
            "[Start of document: {}]\n{}\n[End of document: {}]\n",
            name, document.text, name
        )?;
        self.written += 1;
        Ok(())
    }

    pub fn documents_written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer
    pub fn finish(mut self) -> ScanResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// One line describing how a batch went
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut line = format!(
        "Processed {} files: {} succeeded, {} failed",
        summary.total(),
        summary.succeeded,
        summary.failed
    );
    if summary.skipped > 0 {
        let _ = write!(line, ", {} skipped", summary.skipped);
    }
    // Sub-millisecond precision only adds noise here.
    let elapsed = Duration::from_millis(summary.elapsed.as_millis() as u64);
    let _ = write!(line, " in {}", humantime::format_duration(elapsed));
    line
}

pub fn render_search_report(report: &SearchReport, format: ReportFormat) -> ScanResult<String> {
    if format == ReportFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let mut out = String::new();
    if report.matches.is_empty() {
        let _ = writeln!(out, "No PDF files contain \"{}\"", report.phrase);
    } else {
        let _ = writeln!(
            out,
            "Found {} matching PDF files for \"{}\":",
            report.files_with_matches(),
            report.phrase
        );
        for m in &report.matches {
            let _ = writeln!(
                out,
                "{} ({} {})",
                m.path.display(),
                m.occurrence_count,
                if m.occurrence_count == 1 { "occurrence" } else { "occurrences" }
            );
            for snippet in &m.snippets {
                let _ = writeln!(out, "    {}", snippet);
            }
        }
    }
    let _ = writeln!(
        out,
        "\n{} occurrences in {} of {} documents searched",
        report.total_occurrences,
        report.files_with_matches(),
        report.documents_searched
    );
    Ok(out)
}

/// Text or JSON analysis report; the text form lists at most `max_ranked` documents
pub fn render_analysis_report(
    report: &AnalysisReport,
    max_ranked: usize,
    format: ReportFormat,
) -> ScanResult<String> {
    if format == ReportFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "PDFScan Statistical Analysis Report");
    let _ = writeln!(out, "===================================\n");
    let _ = writeln!(out, "Keywords: {}", report.keywords.join(", "));
    let _ = writeln!(out, "Total documents analyzed: {}", report.documents_analyzed);
    let _ = writeln!(out, "Correlation threshold: {:.2}\n", report.threshold);

    let _ = writeln!(out, "Correlated Keyword Pairs (|r| >= {:.2}):", report.threshold);
    if report.significant_pairs.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for pair in &report.significant_pairs {
        let _ = writeln!(
            out,
            "  {} <-> {}: {:+.3}",
            pair.first, pair.second, pair.coefficient
        );
    }

    let _ = writeln!(out, "\nKeyword Correlation Matrix:\n");
    let n = report.matrix.len();
    out.push_str("    ");
    for i in 0..n {
        let _ = write!(out, "{:<6}", i);
    }
    out.push('\n');
    for i in 0..n {
        let _ = write!(out, "{:<3} ", i);
        for j in 0..n {
            match report.matrix.get(i, j) {
                Some(r) => {
                    let _ = write!(out, "{:<+6.2}", r);
                }
                None => out.push_str("----  "),
            }
        }
        out.push('\n');
    }
    let _ = writeln!(out, "\nKeyword Index Mapping:");
    for (i, keyword) in report.keywords.iter().enumerate() {
        let _ = writeln!(out, "{}: {}", i, keyword);
    }

    let _ = writeln!(out, "\nRanked Documents by Keyword Relevance:");
    let _ = writeln!(out, "======================================");
    let mut listed = 0;
    for (i, ranked) in report.ranking.iter().take(max_ranked).enumerate() {
        if ranked.score > 0.0 {
            let _ = writeln!(
                out,
                "{}. {} (score: {:.2})",
                i + 1,
                display_name(&ranked.path),
                ranked.score
            );
            listed += 1;
        }
    }
    if listed == 0 {
        let _ = writeln!(out, "No document mentions any keyword.");
    }

    Ok(out)
}
