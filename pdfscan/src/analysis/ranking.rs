//! Document relevance scoring.
//!
//! The base score is the sum of keyword counts. In correlation-boosted mode a
//! document also earns `r · min(c_i, c_j)` for every keyword pair with r > 0 that
//! it contains both halves of. Negative coefficients never subtract, which
//! keeps scores non-negative and non-decreasing in every count.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::path::PathBuf;

use super::correlation::CorrelationMatrix;
use crate::config::RankingMode;
use crate::results::RankedDocument;

/// Relevance of one keyword vector against `matrix`
pub fn relevance_score(counts: &[usize], matrix: &CorrelationMatrix, mode: RankingMode) -> f64 {
    let base: f64 = counts.iter().map(|&c| c as f64).sum();
    if mode == RankingMode::Frequency {
        return base;
    }

    let mut boost = 0.0;
    for i in 0..counts.len() {
        if counts[i] == 0 {
            continue;
        }
        for j in (i + 1)..counts.len() {
            if counts[j] == 0 {
                continue;
            }
            if let Some(r) = matrix.get(i, j).filter(|r| *r > 0.0) {
                boost += r * counts[i].min(counts[j]) as f64;
            }
        }
    }
    base + boost
}

/// Sorts documents by descending score, ties by ascending path
pub fn rank(
    vectors: &[(PathBuf, Vec<usize>)],
    matrix: &CorrelationMatrix,
    mode: RankingMode,
) -> Vec<RankedDocument> {
    let mut ranked: Vec<RankedDocument> = vectors
        .par_iter()
        .map(|(path, counts)| RankedDocument {
            path: path.clone(),
            score: relevance_score(counts, matrix, mode),
        })
        .collect();

    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &RankedDocument, b: &RankedDocument) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{}", i)).collect()
    }

    fn corpus() -> Vec<(PathBuf, Vec<usize>)> {
        vec![
            (PathBuf::from("d1.pdf"), vec![3, 2, 0]),
            (PathBuf::from("d2.pdf"), vec![0, 5, 1]),
            (PathBuf::from("d3.pdf"), vec![4, 3, 0]),
            (PathBuf::from("d4.pdf"), vec![1, 0, 6]),
        ]
    }

    fn matrix_for(vectors: &[(PathBuf, Vec<usize>)]) -> CorrelationMatrix {
        let counts: Vec<Vec<usize>> = vectors.iter().map(|(_, c)| c.clone()).collect();
        CorrelationMatrix::build(names(3), &counts)
    }

    #[test]
    fn test_scores_are_non_negative() {
        let vectors = corpus();
        let matrix = matrix_for(&vectors);
        for ranked in rank(&vectors, &matrix, RankingMode::CorrelationBoosted) {
            assert!(ranked.score >= 0.0);
        }
    }

    #[test]
    fn test_score_is_monotone_in_each_count() {
        let matrix = matrix_for(&corpus());
        let base = [2, 3, 1];
        let before = relevance_score(&base, &matrix, RankingMode::CorrelationBoosted);

        for k in 0..3 {
            let mut bumped = base;
            bumped[k] += 4;
            let after = relevance_score(&bumped, &matrix, RankingMode::CorrelationBoosted);
            assert!(after >= before, "raising k{} lowered the score", k);
        }
    }

    #[test]
    fn test_positive_correlation_boosts() {
        // k0 and k1 rise together across the corpus
        let counts = vec![vec![1, 1, 0], vec![2, 2, 1], vec![3, 3, 0]];
        let matrix = CorrelationMatrix::build(names(3), &counts);

        let boosted = relevance_score(&[2, 2, 0], &matrix, RankingMode::CorrelationBoosted);
        let frequency = relevance_score(&[2, 2, 0], &matrix, RankingMode::Frequency);
        assert_eq!(frequency, 4.0);
        assert!((boosted - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_keyword_contributes_nothing() {
        let counts = vec![vec![1, 0, 2], vec![3, 0, 1], vec![0, 0, 5]];
        let matrix = CorrelationMatrix::build(names(3), &counts);
        let with_ghost = relevance_score(&[3, 0, 1], &matrix, RankingMode::CorrelationBoosted);
        let two_keywords = CorrelationMatrix::build(
            vec!["k0".to_string(), "k2".to_string()],
            &[vec![1, 2], vec![3, 1], vec![0, 5]],
        );
        let without = relevance_score(&[3, 1], &two_keywords, RankingMode::CorrelationBoosted);
        assert_eq!(with_ghost, without);
    }

    #[test]
    fn test_ties_break_by_path() {
        let vectors = vec![
            (PathBuf::from("b.pdf"), vec![2]),
            (PathBuf::from("c.pdf"), vec![5]),
            (PathBuf::from("a.pdf"), vec![2]),
        ];
        let matrix = CorrelationMatrix::build(names(1), &[vec![2], vec![5], vec![2]]);
        let ranked = rank(&vectors, &matrix, RankingMode::CorrelationBoosted);

        let order: Vec<_> = ranked.iter().map(|r| r.path.to_str().unwrap()).collect();
        assert_eq!(order, vec!["c.pdf", "a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_two_document_scenario() {
        let vectors = vec![
            (PathBuf::from("D2"), vec![0, 5]),
            (PathBuf::from("D1"), vec![3, 2]),
        ];
        let counts: Vec<Vec<usize>> = vectors.iter().map(|(_, c)| c.clone()).collect();
        let matrix = CorrelationMatrix::build(names(2), &counts);
        let ranked = rank(&vectors, &matrix, RankingMode::CorrelationBoosted);

        // r = -1 gives no boost, and both documents total 5
        assert_eq!(ranked[0].score, 5.0);
        assert_eq!(ranked[1].score, 5.0);
        assert_eq!(ranked[0].path, PathBuf::from("D1"));
    }

    #[test]
    fn test_empty_corpus_ranks_nothing() {
        let matrix = CorrelationMatrix::build(names(2), &[]);
        assert!(rank(&[], &matrix, RankingMode::CorrelationBoosted).is_empty());
    }
}
