//! Progress and log events flowing from workers to the reporting sink.

use std::sync::mpsc;

/// Identifier of one conversion job within a batch.
pub type JobId = u64;

/// Lifecycle of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Extracting,
    Transforming,
    Repacking,
    Done,
    Failed,
    Cancelled,
}

/// Terminal result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job ran to completion. `documents` is the number of markup
    /// documents transformed; zero means the archive contained none and
    /// no output file was produced.
    Completed { documents: usize },
    Failed { error: String },
    Cancelled,
}

/// Events produced by workers and consumed by a single reporting sink.
///
/// Ordering between events of different jobs is not guaranteed; events of
/// one job arrive in causal order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Log(String),
    JobStarted {
        job_id: JobId,
    },
    /// One document of a job finished; `increment` is `1/documents`.
    DocumentProgress {
        job_id: JobId,
        document: String,
        increment: f64,
    },
    /// One job of the batch reached a terminal state; `increment` is
    /// `1/jobs`.
    JobProgress {
        increment: f64,
    },
    JobFinished {
        job_id: JobId,
        outcome: JobOutcome,
    },
    BatchFinished,
}

/// Sink for progress events. Implementations must never block producers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink backed by an unbounded channel sender.
///
/// Send failures are ignored: a consumer that hung up simply stops
/// observing a batch already in flight.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}
