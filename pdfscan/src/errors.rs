//! Error types for pdfscan.
//!
//! Two layers of failure exist and they never mix:
//!
//! 1. **Per-file failures** ([`ExtractionFailure`]) are values. A worker that cannot
//!    read or parse a document records the failure and moves on to the next file;
//!    the batch as a whole keeps going.
//! 2. **Operation failures** ([`ScanError`]) abort the requested command: an invalid
//!    configuration, nothing to process, or an archive that cannot be written.
//!
//! Both carry an [`ErrorKind`] so the CLI can report them uniformly:
//! ```rust,ignore
//! match engine.analyze(&inputs, &keywords) {
//!     Ok(report) => // render report, list report.summary.failures on stderr,
//!     Err(e) if e.kind() == ErrorKind::ConfigurationError => // exit non-zero,
//!     Err(e) => // other fatal error,
//! }
//! ```
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for fatal, operation-wide failures
pub type ScanResult<T> = Result<T, ScanError>;

/// Classification shared by per-file failures and fatal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Path does not resolve to a readable file
    NotFound,
    PermissionDenied,
    /// PDF structure cannot be parsed
    UnsupportedOrCorrupted,
    /// Text decoded with irrecoverable loss
    EncodingRecoveryFailed,
    ArchiveWriteFailed,
    /// Extraction output or report could not be written
    OutputWriteFailed,
    ConfigurationError,
    /// File was never processed because the run was cancelled
    Skipped,
}

impl ErrorKind {
    /// Kinds recorded against a single file without aborting the batch
    pub fn is_per_file(self) -> bool {
        matches!(
            self,
            ErrorKind::NotFound
                | ErrorKind::PermissionDenied
                | ErrorKind::UnsupportedOrCorrupted
                | ErrorKind::EncodingRecoveryFailed
                | ErrorKind::Skipped
        )
    }

    /// Kinds that end the current operation with a non-zero exit status
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::ArchiveWriteFailed
                | ErrorKind::OutputWriteFailed
                | ErrorKind::ConfigurationError
        )
    }

    /// Maps an I/O error raised while reading an input file
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::UnsupportedOrCorrupted,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::UnsupportedOrCorrupted => "unsupported or corrupted PDF",
            ErrorKind::EncodingRecoveryFailed => "text encoding could not be recovered",
            ErrorKind::ArchiveWriteFailed => "archive write failed",
            ErrorKind::OutputWriteFailed => "output write failed",
            ErrorKind::ConfigurationError => "configuration error",
            ErrorKind::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Terminal record for a file that produced no document. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{}: {cause}: {detail}", path.display())]
pub struct ExtractionFailure {
    pub path: PathBuf,
    pub cause: ErrorKind,
    pub detail: String,
}

impl ExtractionFailure {
    pub fn new(path: impl Into<PathBuf>, cause: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cause,
            detail: detail.into(),
        }
    }

    pub fn from_io(path: &Path, err: &std::io::Error) -> Self {
        Self::new(path, ErrorKind::from_io(err), err.to_string())
    }

    pub fn corrupted(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::UnsupportedOrCorrupted, detail)
    }

    pub fn encoding(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::EncodingRecoveryFailed, detail)
    }

    pub fn skipped(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ErrorKind::Skipped, "run cancelled before the file was processed")
    }

    pub fn is_skipped(&self) -> bool {
        self.cause == ErrorKind::Skipped
    }
}

/// Errors that abort the current operation
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("No PDF files found in the provided paths")]
    NoInputFiles,
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
    #[error("Failed to write archive {}: {message}", path.display())]
    ArchiveWrite { path: PathBuf, message: String },
    /// Operation-level I/O; input files fail through [`ExtractionFailure`] instead
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ScanError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn archive_write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ArchiveWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Where this error sits in the shared taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::ConfigError(_) | ScanError::NoInputFiles | ScanError::ConfigLoad(_) => {
                ErrorKind::ConfigurationError
            }
            ScanError::ArchiveWrite { .. } => ErrorKind::ArchiveWriteFailed,
            ScanError::IoError(_) => ErrorKind::OutputWriteFailed,
            ScanError::JsonError(_) => ErrorKind::ConfigurationError,
        }
    }
}
