//! Pairwise keyword correlation across a corpus.
//!
//! Every document is one sample and every keyword one variable. The coefficient
//! is Pearson's r over occurrence counts:
//!
//! ```text
//! r = Σ(x - x̄)(y - ȳ) / sqrt(Σ(x - x̄)² · Σ(y - ȳ)²)
//! ```
//!
//! With fewer than two documents, or when either keyword's counts do not vary,
//! the denominator is zero and r is defined as 0.

use rayon::prelude::*;
use serde::Serialize;

/// One off-diagonal entry of the matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordPair {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

/// Symmetric keyword × keyword matrix, keywords in caller order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    keywords: Vec<String>,
    /// Row-major, `keywords.len()²` entries; the diagonal is stored as 1.0 but never exposed
    #[serde(skip)]
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// A matrix over `keywords` with every coefficient 0
    pub fn empty(keywords: Vec<String>) -> Self {
        let n = keywords.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self { keywords, values }
    }

    /// Builds the matrix from per-document keyword vectors.
    ///
    /// Each vector holds one count per keyword, in the same order as `keywords`.
    pub fn build(keywords: Vec<String>, vectors: &[Vec<usize>]) -> Self {
        let mut matrix = Self::empty(keywords);
        let n = matrix.keywords.len();
        if vectors.len() < 2 || n < 2 {
            return matrix;
        }

        // Column-major copy so each keyword's samples are contiguous.
        let columns: Vec<Vec<f64>> = (0..n)
            .map(|k| {
                vectors
                    .iter()
                    .map(|v| v.get(k).copied().unwrap_or(0) as f64)
                    .collect()
            })
            .collect();

        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let coefficients: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| pearson(&columns[i], &columns[j]))
            .collect();

        for (&(i, j), r) in pairs.iter().zip(coefficients) {
            matrix.values[i * n + j] = r;
            matrix.values[j * n + i] = r;
        }
        matrix
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Coefficient between keyword indices `i` and `j`; `None` on the diagonal or out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        if i == j || i >= n || j >= n {
            return None;
        }
        Some(self.values[i * n + j])
    }

    /// Coefficient between two keywords by name
    pub fn coefficient(&self, first: &str, second: &str) -> Option<f64> {
        let i = self.keywords.iter().position(|k| k == first)?;
        let j = self.keywords.iter().position(|k| k == second)?;
        self.get(i, j)
    }

    /// Every unordered pair, in keyword order
    pub fn pairs(&self) -> Vec<KeywordPair> {
        let n = self.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push(KeywordPair {
                    first: self.keywords[i].clone(),
                    second: self.keywords[j].clone(),
                    coefficient: self.values[i * n + j],
                });
            }
        }
        pairs
    }

    /// Pairs whose |r| meets or exceeds `threshold`
    pub fn pairs_above(&self, threshold: f64) -> Vec<KeywordPair> {
        self.pairs()
            .into_iter()
            .filter(|p| p.coefficient.abs() >= threshold)
            .collect()
    }
}

/// Pearson's r, 0 when undefined
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (cov / denominator).clamp(-1.0, 1.0)
}
