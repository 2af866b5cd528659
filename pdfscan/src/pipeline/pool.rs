use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

use super::cancel::CancellationToken;
use crate::analysis::tokenizer::{score, KeywordSet};
use crate::config::ScanConfig;
use crate::errors::{ExtractionFailure, ScanError, ScanResult};
use crate::extract::TextExtractor;
use crate::metrics::PipelineMetrics;
use crate::results::{Document, FileOutcome};

/// Fixed-size set of extraction workers feeding one bounded result queue
pub struct WorkerPool {
    extractor: Arc<dyn TextExtractor>,
    keywords: Arc<KeywordSet>,
    workers: NonZeroUsize,
    queue_capacity: NonZeroUsize,
    cancel: CancellationToken,
    metrics: PipelineMetrics,
}

/// Read-only state every worker holds a handle to
struct WorkerContext {
    extractor: Arc<dyn TextExtractor>,
    keywords: Arc<KeywordSet>,
    cancel: CancellationToken,
    metrics: PipelineMetrics,
}

impl WorkerPool {
    pub fn new(extractor: Arc<dyn TextExtractor>, keywords: KeywordSet) -> Self {
        let defaults = ScanConfig::default();
        Self {
            extractor,
            keywords: Arc::new(keywords),
            workers: defaults.thread_count,
            queue_capacity: defaults.queue_capacity,
            cancel: CancellationToken::new(),
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn from_config(
        config: &ScanConfig,
        extractor: Arc<dyn TextExtractor>,
        keywords: KeywordSet,
    ) -> Self {
        Self::new(extractor, keywords)
            .with_workers(config.thread_count)
            .with_queue_capacity(config.queue_capacity)
    }

    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Starts processing `paths` and returns the stream of per-file outcomes.
    ///
    /// Every path produces exactly one outcome. Outcomes arrive in completion
    /// order, not submission order. Workers block once `queue_capacity` outcomes
    /// are waiting, so a slow consumer bounds the number of documents in memory.
    pub fn run(&self, paths: Vec<PathBuf>) -> ScanResult<ResultStream> {
        let submitted = paths.len();
        self.metrics.record_submitted(submitted as u64);

        let (job_tx, job_rx) = unbounded::<PathBuf>();
        for path in paths {
            // The receiver is held locally, so sending cannot fail here.
            let _ = job_tx.send(path);
        }
        drop(job_tx);

        let (result_tx, result_rx) = bounded::<FileOutcome>(self.queue_capacity.get());

        let context = Arc::new(WorkerContext {
            extractor: Arc::clone(&self.extractor),
            keywords: Arc::clone(&self.keywords),
            cancel: self.cancel.clone(),
            metrics: self.metrics.clone(),
        });

        let worker_count = self.workers.get().min(submitted);
        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let context = Arc::clone(&context);
            let spawned = thread::Builder::new()
                .name(format!("pdfscan-worker-{}", id))
                .spawn(move || worker_loop(id, jobs, results, context));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("Could not spawn worker {}: {}", id, e),
            }
        }
        drop(result_tx);

        if handles.is_empty() && submitted > 0 {
            return Err(ScanError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no extraction worker could be started",
            )));
        }

        debug!(
            "Started {} workers for {} files (queue capacity {})",
            handles.len(),
            submitted,
            self.queue_capacity
        );

        Ok(ResultStream {
            receiver: Some(result_rx),
            workers: handles,
            submitted,
        })
    }
}

fn worker_loop(
    id: usize,
    jobs: Receiver<PathBuf>,
    results: Sender<FileOutcome>,
    context: Arc<WorkerContext>,
) {
    while let Ok(path) = jobs.recv() {
        trace!("Worker {} took {}", id, path.display());
        let outcome = process_file(&context, path);

        match &outcome {
            Ok(doc) => context
                .metrics
                .record_document(doc.text.chars().count() as u64, doc.token_count as u64),
            Err(failure) => {
                context.metrics.record_failure(failure.cause);
                if !failure.is_skipped() {
                    warn!("Error processing {}", failure);
                }
            }
        }

        if results.send(outcome).is_err() {
            debug!("Result stream dropped, worker {} stopping", id);
            break;
        }
    }
    trace!("Worker {} finished", id);
}

/// Extracts and scores one file. Never panics and never fails the batch.
fn process_file(context: &WorkerContext, path: PathBuf) -> FileOutcome {
    if context.cancel.is_cancelled() {
        return Err(ExtractionFailure::skipped(path));
    }

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_, ExtractionFailure> {
        let text = context.extractor.extract(&path)?;
        let scored = score(&text, &context.keywords);
        Ok((text, scored))
    }));

    match attempt {
        Ok(Ok((text, scored))) => Ok(Document {
            path,
            text,
            token_count: scored.token_count,
            keyword_counts: scored.keyword_counts,
        }),
        Ok(Err(failure)) => Err(failure),
        Err(_) => Err(ExtractionFailure::corrupted(
            path,
            "worker panicked while processing the document",
        )),
    }
}

/// Outcomes of one [`WorkerPool::run`], in completion order.
///
/// Iteration ends once every worker has finished. Dropping the stream early
/// stops the workers after their current file.
pub struct ResultStream {
    receiver: Option<Receiver<FileOutcome>>,
    workers: Vec<JoinHandle<()>>,
    submitted: usize,
}

impl ResultStream {
    /// Number of paths submitted to the run
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    fn join_workers(&mut self) {
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.join() {
                error!("A worker thread panicked: {:?}", e);
            }
        }
    }
}

impl Iterator for ResultStream {
    type Item = FileOutcome;

    fn next(&mut self) -> Option<FileOutcome> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                // Every sender is gone: all workers are done.
                self.receiver = None;
                self.join_workers();
                None
            }
        }
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        // Release blocked senders before waiting on their threads.
        self.receiver.take();
        self.join_workers();
    }
}
