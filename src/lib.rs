//! # embold
//!
//! A converter that turns EPUB ebooks into "bionic reading" copies: the
//! leading characters of every word in body text are wrapped in `<b>`
//! markers so the eye can anchor on word prefixes.
//!
//! ## Features
//!
//! - Streaming tokenization of XHTML content documents
//! - Word-prefix bolding with punctuation-aware joining
//! - ZIP container unpack/repack with per-job scoped working directories
//! - Concurrent batch conversion with progress events and cooperative
//!   cancellation
//!
//! ## Quick Start
//!
//! ```no_run
//! use embold::{run_batch, BatchOptions, CancelToken, ProgressEvent};
//!
//! let cancel = CancelToken::new();
//! let handle = run_batch(
//!     vec!["book.epub".into()],
//!     "out",
//!     BatchOptions::default(),
//!     cancel.clone(),
//! )?;
//!
//! for event in handle.events() {
//!     if let ProgressEvent::Log(line) = event {
//!         println!("{line}");
//!     }
//! }
//! # Ok::<(), embold::Error>(())
//! ```
//!
//! The text transformation is also available standalone:
//!
//! ```
//! use embold::bold;
//!
//! assert_eq!(bold("Hello, world!"), "<b>Hel</b>lo, <b>wor</b>ld!");
//! ```

pub mod archive;
pub mod batch;
#[cfg(feature = "cli")]
pub mod config;
pub mod error;
pub mod markup;
pub(crate) mod util;

pub use batch::{
    BatchHandle, BatchOptions, CancelToken, ChannelSink, ConversionJob, EventSink, JobId,
    JobOutcome, JobState, ProgressEvent, run_batch,
};
#[cfg(feature = "cli")]
pub use config::{Settings, load_settings, save_settings};
pub use error::{Error, Result};
pub use markup::{DOCUMENT_HEADER, MarkupEvent, Tokenizer, bold, transform_document};
