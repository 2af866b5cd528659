//! Text normalization and keyword scoring.
//!
//! Text is split on Unicode word boundaries (UAX #29) and lowercased, so
//! punctuation, whitespace and line breaks inserted by the PDF engine never
//! separate a keyword from its match. Characters that are not part of any word,
//! including U+FFFD left behind by undecodable glyphs, are dropped.
//!
//! A keyword may be a phrase; it matches as a contiguous run of tokens.
//!
//! ```
//! use pdfscan::analysis::tokenizer::{score, KeywordSet};
//!
//! let keywords = KeywordSet::new(["Risk", "interest rate"]);
//! let scored = score("Interest-rate risk; RISK of higher\ninterest rates.", &keywords);
//! assert_eq!(scored.keyword_counts["Risk"], 2);
//! assert_eq!(scored.keyword_counts["interest rate"], 1);
//! assert_eq!(scored.token_count, 8);
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::{ScanError, ScanResult};

/// Splits text into lowercased word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// A configured keyword and its normalized token sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    tokens: Vec<String>,
}

impl Keyword {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tokens: tokenize(text),
        }
    }

    /// True when the keyword has no word characters and can never match
    pub fn is_unmatchable(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Keywords in caller order, trimmed and deduplicated case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    entries: Vec<Keyword>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<Keyword> = Vec::new();
        for raw in keywords {
            let trimmed = raw.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            if entries
                .iter()
                .any(|k| k.text.to_lowercase() == trimmed.to_lowercase())
            {
                continue;
            }
            entries.push(Keyword::new(trimmed));
        }
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|k| k.text.as_str())
    }

    /// Analysis is meaningless without at least one keyword
    pub fn require_non_empty(&self) -> ScanResult<()> {
        if self.is_empty() {
            return Err(ScanError::config_error("No keywords provided for analysis"));
        }
        Ok(())
    }
}

/// Per-document counts produced by [`score`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextScore {
    pub token_count: usize,
    /// Occurrences per keyword, in keyword-set order, zero-filled
    pub keyword_counts: IndexMap<String, usize>,
}

/// Counts keyword occurrences and tokens in `text`. Pure and infallible.
pub fn score(text: &str, keywords: &KeywordSet) -> TextScore {
    let tokens = tokenize(text);

    // Single-word keywords are the common case; one frequency pass serves all of them.
    let needs_frequencies = keywords.iter().any(|k| k.tokens.len() == 1);
    let frequencies: HashMap<&str, usize> = if needs_frequencies {
        let mut freq = HashMap::new();
        for token in &tokens {
            *freq.entry(token.as_str()).or_insert(0) += 1;
        }
        freq
    } else {
        HashMap::new()
    };

    let keyword_counts = keywords
        .iter()
        .map(|keyword| {
            let count = match keyword.tokens.len() {
                0 => 0,
                1 => frequencies
                    .get(keyword.tokens[0].as_str())
                    .copied()
                    .unwrap_or(0),
                _ => count_phrase(&tokens, &keyword.tokens),
            };
            (keyword.text.clone(), count)
        })
        .collect();

    TextScore {
        token_count: tokens.len(),
        keyword_counts,
    }
}

/// Non-overlapping occurrences of `phrase` as a contiguous token run
fn count_phrase(tokens: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + phrase.len() <= tokens.len() {
        if tokens[i..i + phrase.len()] == *phrase {
            count += 1;
            i += phrase.len();
        } else {
            i += 1;
        }
    }
    count
}
