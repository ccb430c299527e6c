use super::bold::bold;
use super::tokenizer::{MarkupEvent, Tokenizer};

/// Fixed header prepended to every transformed document: an XML
/// declaration followed by the legacy XHTML 1.1 DOCTYPE.
pub const DOCUMENT_HEADER: &str = "<?xml version='1.0' encoding='utf-8'?>\n<!DOCTYPE html PUBLIC '-//W3C//DTD XHTML 1.1//EN' 'http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd'>\n";

/// Replay `events` into a serialized document, routing every text run
/// through `transform_text`.
///
/// Tags come out with their attribute order intact and attribute values
/// double-quoted verbatim; no escaping, pretty-printing, or
/// re-indentation happens here. Callers are responsible for supplying
/// attribute text that is already safe, which holds for source documents
/// that were well-formed at the attribute level.
pub fn reassemble<I, F>(events: I, mut transform_text: F) -> String
where
    I: IntoIterator<Item = MarkupEvent>,
    F: FnMut(&str) -> String,
{
    let mut out = String::from(DOCUMENT_HEADER);
    for event in events {
        match event {
            MarkupEvent::OpenTag { name, attributes } => {
                out.push('<');
                out.push_str(&name);
                for (key, value) in &attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                out.push('>');
            }
            MarkupEvent::CloseTag { name } => {
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
            MarkupEvent::TextData(text) => out.push_str(&transform_text(&text)),
        }
    }
    out
}

/// Tokenize `source` and reassemble it with every text run bolded.
pub fn transform_document(source: &str) -> String {
    reassemble(Tokenizer::new(source), bold)
}
