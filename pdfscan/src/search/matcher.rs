use regex::{Regex, RegexBuilder};

use crate::errors::{ScanError, ScanResult};

/// Lowercases text and collapses every whitespace run into one space.
///
/// PDF engines break lines and pad words unpredictably; search runs on this
/// normalized form so a phrase split across lines still matches.
pub fn normalize_text(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.extend(word.chars().flat_map(char::to_lowercase));
    }
    normalized
}

/// Strategy for phrase matching
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    Literal(String),
    Regex(Regex),
}

/// Case-insensitive matcher run against [`normalize_text`] output
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrase: String,
    strategy: MatchStrategy,
}

impl PhraseMatcher {
    /// Matches `phrase` as a substring after normalization
    pub fn literal(phrase: &str) -> ScanResult<Self> {
        let normalized = normalize_text(phrase);
        if normalized.is_empty() {
            return Err(ScanError::config_error("Search phrase must not be empty"));
        }
        Ok(Self {
            phrase: phrase.to_string(),
            strategy: MatchStrategy::Literal(normalized),
        })
    }

    /// Matches a regular expression, case-insensitively
    pub fn regex(pattern: &str) -> ScanResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ScanError::config_error(format!("Invalid search pattern: {}", e)))?;
        if regex.is_match("") {
            return Err(ScanError::config_error(format!(
                "Search pattern '{}' matches empty text",
                pattern
            )));
        }
        Ok(Self {
            phrase: pattern.to_string(),
            strategy: MatchStrategy::Regex(regex),
        })
    }

    /// The phrase as given by the user
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Non-overlapping match ranges in already-normalized text, in order
    pub fn find_matches(&self, normalized: &str) -> Vec<(usize, usize)> {
        match &self.strategy {
            MatchStrategy::Literal(needle) => normalized
                .match_indices(needle.as_str())
                .map(|(start, matched)| (start, start + matched.len()))
                .collect(),
            MatchStrategy::Regex(regex) => regex
                .find_iter(normalized)
                .map(|m| (m.start(), m.end()))
                .collect(),
        }
    }
}

/// Text around `start..end` with up to `context_chars` characters on each side
pub fn snippet(text: &str, start: usize, end: usize, context_chars: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(context_chars)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(context_chars)
        .map_or(text.len(), |(i, _)| end + i);

    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.push_str(&text[from..to]);
    if to < text.len() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(
            normalize_text("  Quarterly\n\n  REPORT\tfor Q1 "),
            "quarterly report for q1"
        );
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("ÉTÉ"), "été");
    }

    #[test]
    fn test_literal_matching_is_case_insensitive() {
        let matcher = PhraseMatcher::literal("Quarterly Report").unwrap();
        let text = normalize_text("QUARTERLY report, then the quarterly\nreport again");
        let matches = matcher.find_matches(&text);
        assert_eq!(matches.len(), 2);
        assert_eq!(&text[matches[0].0..matches[0].1], "quarterly report");
    }

    #[test]
    fn test_literal_matching_is_substring() {
        let matcher = PhraseMatcher::literal("port").unwrap();
        assert_eq!(matcher.find_matches("report export port").len(), 3);
    }

    #[test]
    fn test_empty_phrase_is_rejected() {
        assert!(PhraseMatcher::literal("").is_err());
        assert!(PhraseMatcher::literal(" \n\t").is_err());
    }

    #[test]
    fn test_regex_matching() {
        let matcher = PhraseMatcher::regex(r"q[1-4] (report|summary)").unwrap();
        let text = normalize_text("Q1 Report and q3 SUMMARY but not q5 report");
        assert_eq!(matcher.find_matches(&text).len(), 2);
        assert_eq!(matcher.phrase(), r"q[1-4] (report|summary)");
    }

    #[test]
    fn test_bad_regex_is_configuration_error() {
        let err = PhraseMatcher::regex("(unclosed").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::ConfigurationError);
        assert!(PhraseMatcher::regex("a*").is_err());
    }

    #[test]
    fn test_snippet_context() {
        let text = "the quarterly report is attached";
        assert_eq!(snippet(text, 4, 20, 4), "the quarterly report is ...");
        assert_eq!(snippet(text, 14, 20, 3), "...ly report is...");
        assert_eq!(snippet(text, 0, 3, 100), "the quarterly report is attached");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let text = "ééé match ééé";
        let start = text.find("match").unwrap();
        let end = start + "match".len();
        assert_eq!(snippet(text, start, end, 2), "...é match é...");
    }
}
