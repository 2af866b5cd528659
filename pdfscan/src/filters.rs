//! Discovery of PDF documents under the user-supplied input paths.
//!
//! Inputs may name files or directories. Directories are walked recursively with
//! `ignore::WalkBuilder`. Hidden entries are skipped, but `.ignore` and
//! `.gitignore` files are not honoured: the configured `ignore_patterns` are the
//! only way to exclude a document. The returned list is sorted and free of duplicates, which keeps
//! submission order stable between runs even though workers complete out of order.
use glob::Pattern;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Checks if a file has one of the accepted extensions (case-insensitive)
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// Checks if a file should be ignored based on ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let normalized_path = path.to_string_lossy().replace('\\', "/");

    ignore_patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(p) => p.matches(&normalized_path),
        Err(e) => {
            debug!("Ignoring invalid glob pattern '{}': {}", pattern, e);
            false
        }
    })
}

/// Determines if a discovered file is a document to process
pub fn should_include_file(path: &Path, extensions: &[String], ignore_patterns: &[String]) -> bool {
    has_valid_extension(path, extensions) && !should_ignore(path, ignore_patterns)
}

/// Collects every document below `inputs`, sorted and deduplicated
pub fn collect_pdf_paths(
    inputs: &[PathBuf],
    extensions: &[String],
    ignore_patterns: &[String],
) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for input in inputs {
        if !input.exists() {
            warn!("Skipping invalid path: {}", input.display());
            continue;
        }

        if input.is_file() {
            if should_include_file(input, extensions, ignore_patterns) {
                paths.push(input.clone());
            } else {
                warn!("Skipping non-PDF file: {}", input.display());
            }
            continue;
        }

        let mut walker = WalkBuilder::new(input);
        walker
            .hidden(true)
            .parents(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false);

        let before = paths.len();
        paths.extend(
            walker
                .build()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Error walking {}: {}", input.display(), e);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
                .filter(|entry| should_include_file(entry.path(), extensions, ignore_patterns))
                .map(|entry| entry.into_path()),
        );
        debug!(
            "Found {} documents under {}",
            paths.len() - before,
            input.display()
        );
    }

    paths.sort();
    paths.dedup();
    paths
}
