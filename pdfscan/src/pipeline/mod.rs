//! The document pipeline: a fixed pool of worker threads that each take one file,
//! extract its text, score it against the keyword set and hand the result off.
//!
//! ```text
//!  paths ──► job queue ──► worker 1..N ──► bounded result queue ──► consumer
//!                          (extract + score)        (backpressure)
//! ```
//!
//! Workers share only read-only state (extractor, keyword set, cancellation flag).
//! Each [`Document`](crate::results::Document) or
//! [`ExtractionFailure`](crate::errors::ExtractionFailure) is owned by exactly one
//! worker until it is sent, then by the consumer. There are no locks on the hot
//! path; the result queue is the only synchronization point.
mod cancel;
mod pool;

pub use cancel::CancellationToken;
pub use pool::{ResultStream, WorkerPool};
