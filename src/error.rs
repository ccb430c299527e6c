//! Error types for embold operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while converting an archive.
///
/// Every variant is caught at the job boundary by the batch orchestrator;
/// a failing archive never aborts its siblings.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container's central directory could not be read.
    #[error("unreadable container: {source}")]
    CorruptArchive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to read document {}: {source}", .path.display())]
    DocumentRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write document {}: {source}", .path.display())]
    DocumentWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Archive construction failed after the documents were transformed.
    #[error("failed to repack archive {}: {source}", .path.display())]
    Repack {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
