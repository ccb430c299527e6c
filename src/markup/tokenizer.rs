use std::collections::VecDeque;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// A structural event produced while scanning a markup document.
///
/// Events come out in document order. Self-closing source tags (`<br/>`)
/// surface as an [`MarkupEvent::OpenTag`] immediately followed by the
/// matching [`MarkupEvent::CloseTag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    OpenTag {
        name: String,
        /// Attributes in source order, values verbatim (no entity decoding).
        attributes: Vec<(String, String)>,
    },
    CloseTag {
        name: String,
    },
    TextData(String),
}

/// Lazy tokenizer over a markup document.
///
/// Comments, processing instructions, XML declarations, and DOCTYPEs are
/// dropped. Entity and character references stay verbatim inside the
/// surrounding text run (`&amp;` comes out as `&amp;`), so an
/// untransformed round trip preserves them exactly. Adjacent text pieces
/// merge into a single [`MarkupEvent::TextData`].
///
/// Malformed input never raises an error: the tokenizer emits what it can
/// parse and stops at the first unrecoverable parse failure.
pub struct Tokenizer<'a> {
    reader: Reader<&'a [u8]>,
    pending_text: String,
    queued: VecDeque<MarkupEvent>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        Self {
            reader,
            pending_text: String::new(),
            queued: VecDeque::new(),
            done: false,
        }
    }

    /// Take the accumulated text run, if any.
    fn flush_text(&mut self) -> Option<MarkupEvent> {
        if self.pending_text.is_empty() {
            None
        } else {
            Some(MarkupEvent::TextData(std::mem::take(&mut self.pending_text)))
        }
    }

    /// Queue `event` behind any pending text and return what goes out first.
    fn emit(&mut self, event: MarkupEvent) -> MarkupEvent {
        match self.flush_text() {
            Some(text) => {
                self.queued.push_back(event);
                text
            }
            None => event,
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = MarkupEvent;

    fn next(&mut self) -> Option<MarkupEvent> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(event);
            }
            if self.done {
                return self.flush_text();
            }
            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let open = open_tag(&e);
                    return Some(self.emit(open));
                }
                Ok(Event::End(e)) => {
                    let close = MarkupEvent::CloseTag {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    };
                    return Some(self.emit(close));
                }
                Ok(Event::Empty(e)) => {
                    let open = open_tag(&e);
                    let close = MarkupEvent::CloseTag {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    };
                    let first = self.emit(open);
                    self.queued.push_back(close);
                    return Some(first);
                }
                Ok(Event::Text(e)) => {
                    self.pending_text
                        .push_str(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::CData(e)) => {
                    self.pending_text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::GeneralRef(e)) => {
                    // Keep references opaque: &name; round-trips unchanged.
                    self.pending_text.push('&');
                    self.pending_text
                        .push_str(&String::from_utf8_lossy(e.as_ref()));
                    self.pending_text.push(';');
                }
                Ok(Event::Comment(_))
                | Ok(Event::PI(_))
                | Ok(Event::Decl(_))
                | Ok(Event::DocType(_)) => {}
                Ok(Event::Eof) | Err(_) => {
                    // Best-effort tolerance: stop at the first hard parse
                    // failure, flushing whatever text was accumulated.
                    self.done = true;
                }
            }
        }
    }
}

fn open_tag(e: &BytesStart) -> MarkupEvent {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect();
    MarkupEvent::OpenTag { name, attributes }
}
