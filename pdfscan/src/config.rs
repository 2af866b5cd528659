use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};

/// Configuration shared by the extract, search and analyze operations.
///
/// # Configuration Locations
///
/// Loaded from the following locations in order of precedence (later wins):
/// 1. Global `$CONFIG_DIR/pdfscan/config.yaml`
/// 2. Local `.pdfscan.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// Command-line flags are applied last through [`ScanConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Worker threads (default: CPU cores)
/// thread_count: 8
///
/// # Documents that may wait in the result queue before workers block
/// queue_capacity: 16
///
/// # concurrent | serialized
/// extractor_access: concurrent
///
/// # failfast | lossy
/// encoding_mode: failfast
///
/// ignore_patterns:
///   - "**/drafts/**"
///
/// threshold: 0.1
/// ranking: correlation_boosted
/// cache_dir: "/tmp/pdfscan-cache"
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of extraction workers
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Bound of the result queue between workers and the consumer
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: NonZeroUsize,

    /// File extensions treated as PDF documents (case-insensitive)
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,

    /// Glob patterns excluded from discovery
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether the extraction engine may be called from several workers at once
    #[serde(default)]
    pub extractor_access: ExtractorAccess,

    /// How replacement characters in extracted text are handled
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Minimum absolute correlation for a keyword pair to be reported
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default)]
    pub ranking: RankingMode,

    /// Ranked documents listed in the text report
    #[serde(default = "default_max_ranked")]
    pub max_ranked: usize,

    /// Characters of context kept on each side of a search hit
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,

    /// Snippets kept per matching document
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,

    /// Directory for cached extracted text; caching is off when unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub show_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Capability contract for the extraction engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorAccess {
    /// The engine is safe to call from every worker concurrently
    #[default]
    Concurrent,
    /// All calls go through one lock; at most one extraction is in flight
    Serialized,
}

/// Handling of U+FFFD replacement characters in extracted text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Fail the file when too much of the text was undecodable
    #[default]
    #[serde(alias = "fail_fast")]
    Failfast,
    /// Strip replacement characters and keep whatever text remains
    Lossy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Raw keyword frequency only
    Frequency,
    /// Frequency plus a boost for positively correlated keyword pairs
    #[default]
    CorrelationBoosted,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_queue_capacity() -> NonZeroUsize {
    NonZeroUsize::new(16).unwrap_or(NonZeroUsize::MIN)
}

fn default_file_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_threshold() -> f64 {
    0.1
}

fn default_max_ranked() -> usize {
    20
}

fn default_context_chars() -> usize {
    40
}

fn default_max_snippets() -> usize {
    3
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            thread_count: default_thread_count(),
            queue_capacity: default_queue_capacity(),
            file_extensions: default_file_extensions(),
            ignore_patterns: Vec::new(),
            extractor_access: ExtractorAccess::default(),
            encoding_mode: EncodingMode::default(),
            threshold: default_threshold(),
            ranking: RankingMode::default(),
            max_ranked: default_max_ranked(),
            context_chars: default_context_chars(),
            max_snippets: default_max_snippets(),
            cache_dir: None,
            show_progress: false,
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` leaves the file value in place
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub thread_count: Option<NonZeroUsize>,
    pub threshold: Option<f64>,
    pub cache_dir: Option<PathBuf>,
    pub serialize_extraction: bool,
    pub lossy_encoding: bool,
    pub frequency_only: bool,
    pub show_progress: bool,
    pub log_level: Option<String>,
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> ScanResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> ScanResult<Self> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ScanError::config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("pdfscan/config.yaml")),
            Some(PathBuf::from(".pdfscan.yaml")),
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        let config: ScanConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Merges CLI arguments over configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(threads) = cli.thread_count {
            self.thread_count = threads;
        }
        if let Some(threshold) = cli.threshold {
            self.threshold = threshold;
        }
        if cli.cache_dir.is_some() {
            self.cache_dir = cli.cache_dir;
        }
        if cli.serialize_extraction {
            self.extractor_access = ExtractorAccess::Serialized;
        }
        if cli.lossy_encoding {
            self.encoding_mode = EncodingMode::Lossy;
        }
        if cli.frequency_only {
            self.ranking = RankingMode::Frequency;
        }
        if cli.show_progress {
            self.show_progress = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Rejects values no operation can run with
    pub fn validate(&self) -> ScanResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ScanError::config_error(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        if self.file_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ScanError::config_error(
                "at least one file extension is required",
            ));
        }
        Ok(())
    }
}
