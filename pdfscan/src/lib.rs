pub mod analysis;
pub mod archive;
pub mod config;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod filters;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod search;

pub use analysis::{AnalysisReport, CorrelationMatrix, KeywordSet};
pub use config::{ConfigOverrides, ScanConfig};
pub use engine::Engine;
pub use errors::{ErrorKind, ExtractionFailure, ScanError, ScanResult};
pub use extract::TextExtractor;
pub use results::{BatchSummary, Document, RankedDocument, SearchMatch, SearchReport};
