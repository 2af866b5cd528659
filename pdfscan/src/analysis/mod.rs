//! Keyword correlation analysis.
//!
//! [`analyze`] is a fan-in reduction: the pool produces one keyword vector per
//! document, and once every document is in, the matrix and ranking are computed
//! over the whole corpus in one pass.
pub mod correlation;
pub mod ranking;
pub mod tokenizer;

pub use correlation::{CorrelationMatrix, KeywordPair};
pub use tokenizer::{score, tokenize, KeywordSet, TextScore};

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::RankingMode;
use crate::errors::{ScanError, ScanResult};
use crate::results::{BatchSummary, Document, RankedDocument};

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub keywords: Vec<String>,
    #[serde(skip)]
    pub matrix: CorrelationMatrix,
    /// Pairs with |r| >= threshold, in keyword order
    pub significant_pairs: Vec<KeywordPair>,
    pub ranking: Vec<RankedDocument>,
    pub threshold: f64,
    pub ranking_mode: RankingMode,
    pub documents_analyzed: usize,
    pub summary: BatchSummary,
}

/// Counts for each configured keyword, in keyword order, zero-filled
pub fn keyword_vector(document: &Document, keywords: &KeywordSet) -> Vec<usize> {
    keywords.names().map(|k| document.count(k)).collect()
}

/// Builds the correlation matrix and ranking for `documents`
pub fn analyze(
    documents: &[Document],
    keywords: &KeywordSet,
    threshold: f64,
    mode: RankingMode,
) -> ScanResult<AnalysisReport> {
    keywords.require_non_empty()?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ScanError::config_error(format!(
            "Threshold must be between 0 and 1, got {}",
            threshold
        )));
    }

    let names: Vec<String> = keywords.names().map(str::to_string).collect();
    let vectors: Vec<(PathBuf, Vec<usize>)> = documents
        .iter()
        .map(|d| (d.path.clone(), keyword_vector(d, keywords)))
        .collect();
    let counts: Vec<Vec<usize>> = vectors.iter().map(|(_, c)| c.clone()).collect();

    let matrix = CorrelationMatrix::build(names.clone(), &counts);
    let significant_pairs = matrix.pairs_above(threshold);
    let ranking = ranking::rank(&vectors, &matrix, mode);

    debug!(
        "Analyzed {} documents against {} keywords, {} significant pairs",
        documents.len(),
        names.len(),
        significant_pairs.len()
    );

    Ok(AnalysisReport {
        keywords: names,
        matrix,
        significant_pairs,
        ranking,
        threshold,
        ranking_mode: mode,
        documents_analyzed: documents.len(),
        summary: BatchSummary::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn document(path: &str, text: &str, keywords: &KeywordSet) -> Document {
        let scored = score(text, keywords);
        Document {
            path: PathBuf::from(path),
            text: text.to_string(),
            token_count: scored.token_count,
            keyword_counts: scored.keyword_counts,
        }
    }

    #[test]
    fn test_alpha_beta_scenario() {
        let keywords = KeywordSet::new(["alpha", "beta"]);
        let docs = vec![
            document("D2", "beta beta beta beta beta", &keywords),
            document("D1", "alpha alpha alpha beta beta", &keywords),
        ];

        let report = analyze(&docs, &keywords, 0.0, RankingMode::CorrelationBoosted).unwrap();

        assert_eq!(report.significant_pairs.len(), 1);
        let r = report.significant_pairs[0].coefficient;
        assert!((-1.0..=1.0).contains(&r));
        assert_eq!(report.ranking.len(), 2);
        assert_eq!(report.ranking[0].path, PathBuf::from("D1"));
        assert_eq!(report.documents_analyzed, 2);
    }

    #[test]
    fn test_empty_keywords_is_configuration_error() {
        let err = analyze(&[], &KeywordSet::new([" ", ""]), 0.1, RankingMode::Frequency)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let keywords = KeywordSet::new(["a"]);
        for bad in [-0.1, 1.5, f64::NAN] {
            assert!(analyze(&[], &keywords, bad, RankingMode::Frequency).is_err());
        }
    }

    #[test]
    fn test_zero_documents_is_empty_not_error() {
        let keywords = KeywordSet::new(["a", "b"]);
        let report = analyze(&[], &keywords, 0.5, RankingMode::CorrelationBoosted).unwrap();
        assert!(report.ranking.is_empty());
        assert!(report.significant_pairs.is_empty());
        assert_eq!(report.keywords, vec!["a", "b"]);
    }

    #[test]
    fn test_keyword_vector_is_zero_filled_in_order() {
        let keywords = KeywordSet::new(["gamma", "alpha", "missing"]);
        let doc = document("x.pdf", "alpha gamma gamma", &keywords);
        assert_eq!(keyword_vector(&doc, &keywords), vec![2, 1, 0]);
    }

    #[test]
    fn test_threshold_only_filters_report() {
        let keywords = KeywordSet::new(["a", "b"]);
        let docs = vec![
            document("1.pdf", "a b", &keywords),
            document("2.pdf", "a a b b", &keywords),
            document("3.pdf", "a a a b", &keywords),
        ];

        let strict = analyze(&docs, &keywords, 1.0, RankingMode::CorrelationBoosted).unwrap();
        let loose = analyze(&docs, &keywords, 0.0, RankingMode::CorrelationBoosted).unwrap();

        assert!(strict.significant_pairs.is_empty());
        assert_eq!(loose.significant_pairs.len(), 1);
        assert_eq!(strict.ranking, loose.ranking);
    }
}
