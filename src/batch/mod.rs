//! Batch orchestration: a bounded worker pool converting many archives
//! concurrently, with progress events and cooperative cancellation.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::info;

mod events;
mod job;

pub use events::{ChannelSink, EventSink, JobId, JobOutcome, JobState, ProgressEvent};
pub use job::ConversionJob;

use crate::error::Result;

/// Tuning knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Upper bound on concurrently processed jobs.
    pub workers: usize,
    /// Output files are named `<prefix>_<original-filename>`.
    pub output_prefix: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            output_prefix: "b".into(),
        }
    }
}

/// Cooperative cancellation flag shared by every job in a batch.
///
/// Set once by the initiator and never reset while a batch is in flight.
/// Workers check it before starting a job and before each document; a
/// document transform already in flight always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to a running batch, owning the event stream.
///
/// Dropping the handle does not stop the batch; events are then
/// discarded.
pub struct BatchHandle {
    events: Receiver<ProgressEvent>,
    supervisor: JoinHandle<()>,
}

impl BatchHandle {
    /// Blocking iterator over the event stream. It yields until the
    /// channel closes, shortly after [`ProgressEvent::BatchFinished`].
    pub fn events(&self) -> mpsc::Iter<'_, ProgressEvent> {
        self.events.iter()
    }

    /// Drain any remaining events and wait for the batch to finish.
    pub fn wait(self) {
        for _ in self.events.iter() {}
        let _ = self.supervisor.join();
    }
}

/// Convert `inputs` concurrently, writing outputs under `dest`.
///
/// Returns immediately with a [`BatchHandle`]; the caller consumes
/// progress from [`BatchHandle::events`]. `dest` is created if absent.
/// Jobs may complete in any order. Each job reaching a terminal state
/// (done, failed, or cancelled) contributes one `1/jobs` increment of
/// overall progress.
///
/// # Example
///
/// ```no_run
/// use embold::{run_batch, BatchOptions, CancelToken};
///
/// let handle = run_batch(
///     vec!["a.epub".into(), "b.epub".into()],
///     "out",
///     BatchOptions { workers: 2, ..BatchOptions::default() },
///     CancelToken::new(),
/// )?;
/// handle.wait();
/// # Ok::<(), embold::Error>(())
/// ```
pub fn run_batch(
    inputs: Vec<PathBuf>,
    dest: impl Into<PathBuf>,
    options: BatchOptions,
    cancel: CancelToken,
) -> Result<BatchHandle> {
    let dest: PathBuf = dest.into();
    fs::create_dir_all(&dest)?;

    let total = inputs.len();
    let step = if total == 0 { 0.0 } else { 1.0 / total as f64 };

    let (event_tx, event_rx) = mpsc::channel();
    let (job_tx, job_rx) = mpsc::channel::<ConversionJob>();
    for (id, input) in inputs.into_iter().enumerate() {
        let _ = job_tx.send(ConversionJob::new(id as JobId, input));
    }
    drop(job_tx);
    let job_rx = Arc::new(Mutex::new(job_rx));

    let worker_count = options.workers.clamp(1, total.max(1));
    let mut workers = Vec::with_capacity(worker_count);
    for worker in 0..worker_count {
        let job_rx = Arc::clone(&job_rx);
        let sink = ChannelSink::new(event_tx.clone());
        let cancel = cancel.clone();
        let dest = dest.clone();
        let prefix = options.output_prefix.clone();
        let handle = thread::Builder::new()
            .name(format!("embold-worker-{worker}"))
            .spawn(move || {
                loop {
                    let received = match job_rx.lock() {
                        Ok(guard) => guard.recv(),
                        Err(_) => break,
                    };
                    let Ok(mut job) = received else { break };

                    if cancel.is_cancelled() {
                        // Jobs still queued once the signal is set never
                        // start extraction.
                        job.state = JobState::Cancelled;
                        sink.emit(ProgressEvent::JobFinished {
                            job_id: job.id,
                            outcome: JobOutcome::Cancelled,
                        });
                        sink.emit(ProgressEvent::JobProgress { increment: step });
                        continue;
                    }

                    sink.emit(ProgressEvent::JobStarted { job_id: job.id });
                    job::run_job(&mut job, &dest, &prefix, &cancel, &sink);
                    sink.emit(ProgressEvent::JobProgress { increment: step });
                }
            })?;
        workers.push(handle);
    }

    let supervisor = thread::Builder::new()
        .name("embold-batch".into())
        .spawn(move || {
            for worker in workers {
                let _ = worker.join();
            }
            let summary = if cancel.is_cancelled() {
                "Processing cancelled."
            } else {
                "All EPUB files processed successfully."
            };
            info!(total, cancelled = cancel.is_cancelled(), "batch finished");
            let _ = event_tx.send(ProgressEvent::Log(summary.into()));
            let _ = event_tx.send(ProgressEvent::BatchFinished);
        })?;

    Ok(BatchHandle {
        events: event_rx,
        supervisor,
    })
}
