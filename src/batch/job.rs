//! Single-archive conversion: unpack, transform each document, repack.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::archive;
use crate::batch::CancelToken;
use crate::batch::events::{EventSink, JobId, JobOutcome, JobState, ProgressEvent};
use crate::error::{Error, Result};
use crate::markup::transform_document;

/// One input archive moving through the conversion pipeline.
#[derive(Debug)]
pub struct ConversionJob {
    pub id: JobId,
    pub input: PathBuf,
    pub state: JobState,
}

impl ConversionJob {
    pub fn new(id: JobId, input: PathBuf) -> Self {
        Self {
            id,
            input,
            state: JobState::Pending,
        }
    }

    /// Short display name for log messages.
    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

/// Run one job to a terminal state, emitting its events through `sink`.
///
/// Every error is caught here at the job boundary and turned into a
/// logged [`JobOutcome::Failed`]; sibling jobs never see it.
pub(crate) fn run_job(
    job: &mut ConversionJob,
    dest: &Path,
    prefix: &str,
    cancel: &CancelToken,
    sink: &dyn EventSink,
) -> JobOutcome {
    let name = job.file_name();
    let outcome = match convert(job, dest, prefix, cancel, sink) {
        Ok(outcome) => outcome,
        Err(err) => {
            let message = match &err {
                Error::CorruptArchive { .. } => format!("Bad EPUB archive {name}: {err}"),
                _ => format!("Failed to process {name}: {err}"),
            };
            warn!(job = job.id, error = %err, "job failed");
            sink.emit(ProgressEvent::Log(message));
            JobOutcome::Failed {
                error: err.to_string(),
            }
        }
    };

    job.state = match &outcome {
        JobOutcome::Completed { .. } => JobState::Done,
        JobOutcome::Failed { .. } => JobState::Failed,
        JobOutcome::Cancelled => JobState::Cancelled,
    };
    sink.emit(ProgressEvent::JobFinished {
        job_id: job.id,
        outcome: outcome.clone(),
    });
    outcome
}

fn convert(
    job: &mut ConversionJob,
    dest: &Path,
    prefix: &str,
    cancel: &CancelToken,
    sink: &dyn EventSink,
) -> Result<JobOutcome> {
    let name = job.file_name();
    sink.emit(ProgressEvent::Log(format!("Processing {name}...")));

    job.state = JobState::Extracting;
    // The working directory is removed when `workdir` drops, on every
    // path out of this function.
    let workdir = archive::unpack(&job.input)?;
    sink.emit(ProgressEvent::Log(format!("Extracted {name} successfully.")));

    let documents = archive::enumerate_documents(workdir.path());
    if documents.is_empty() {
        info!(job = job.id, "no markup documents");
        sink.emit(ProgressEvent::Log(format!(
            "No markup documents found in {name}"
        )));
        return Ok(JobOutcome::Completed { documents: 0 });
    }

    job.state = JobState::Transforming;
    let step = 1.0 / documents.len() as f64;
    for document in &documents {
        if cancel.is_cancelled() {
            info!(job = job.id, "cancelled before next document");
            return Ok(JobOutcome::Cancelled);
        }
        transform_file(document)?;
        let relative = document.strip_prefix(workdir.path()).unwrap_or(document);
        debug!(job = job.id, document = %relative.display(), "transformed document");
        sink.emit(ProgressEvent::DocumentProgress {
            job_id: job.id,
            document: relative.to_string_lossy().into_owned(),
            increment: step,
        });
    }

    job.state = JobState::Repacking;
    let stem = job
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());
    let output_stem = dest.join(format!("{prefix}_{stem}"));
    let final_path = archive::repack(workdir.path(), &output_stem)?;
    sink.emit(ProgressEvent::Log(format!(
        "Modified EPUB created at {}.",
        final_path.display()
    )));

    Ok(JobOutcome::Completed {
        documents: documents.len(),
    })
}

/// Read, transform, and write back a single markup document in place.
fn transform_file(path: &Path) -> Result<()> {
    let source = archive::read_document(path)?;
    let output = transform_document(&source);
    archive::write_document(path, &output)
}
