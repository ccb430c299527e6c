//! Streaming markup tokenization, word bolding, and reserialization.

mod bold;
mod serializer;
mod tokenizer;

pub use bold::bold;
pub use serializer::{DOCUMENT_HEADER, reassemble, transform_document};
pub use tokenizer::{MarkupEvent, Tokenizer};
