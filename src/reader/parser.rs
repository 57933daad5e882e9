// Streaming parser - turns a growing JUnit XML buffer into events

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::time::Duration;

use crate::reader::ReadError;
use crate::reader::event::{CaseStart, ReportEvent, SuiteStart};
use crate::state::{FailureDetail, FailureKind};

const TAG_REPORT: &[u8] = b"testsuites";
const TAG_TEST_SUITE: &[u8] = b"testsuite";
const TAG_TEST_CASE: &[u8] = b"testcase";
const TAG_FAILURE: &[u8] = b"failure";
const TAG_ERROR: &[u8] = b"error";

/// Incremental parser over bytes appended by a writer that may still be running.
///
/// Only complete elements are consumed. Whatever trails the last complete
/// element stays buffered until more bytes arrive, or until the caller says
/// the writer has finished, at which point it must form a well-formed end of
/// document.
#[derive(Debug, Default)]
pub struct StreamingParser {
    buffer: Vec<u8>,
    offset: u64,
    open: Vec<Vec<u8>>,
    root_seen: bool,
    case_open: bool,
    failure: Option<FailureDetail>,
    failure_text: String,
    complete: bool,
}

impl StreamingParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the report
    pub fn feed(&mut self, bytes: &[u8]) {
        if !self.complete {
            self.buffer.extend_from_slice(bytes);
        }
    }

    /// The root element has closed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Bytes waiting for the rest of their element
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Parse every complete element buffered so far.
    ///
    /// With `finished == false` an element cut off by the end of the buffer is
    /// left for the next call. With `finished == true` the buffer is the whole
    /// remaining document and anything short of a closed root is malformed.
    pub fn parse(&mut self, finished: bool) -> Result<Vec<ReportEvent>, ReadError> {
        let mut events = Vec::new();
        self.parse_into(finished, &mut events)?;
        Ok(events)
    }

    /// Like [`parse`](Self::parse), but keeps the events recognized before an
    /// error in `events`.
    pub fn parse_into(
        &mut self,
        finished: bool,
        events: &mut Vec<ReportEvent>,
    ) -> Result<(), ReadError> {
        if self.complete {
            return Ok(());
        }

        let buffer = std::mem::take(&mut self.buffer);
        let outcome = self.parse_buffer(&buffer, finished, events);
        self.buffer = buffer;

        let consumed = outcome?;
        self.buffer.drain(..consumed);
        self.offset += consumed as u64;
        if self.complete {
            self.buffer.clear();
        }

        Ok(())
    }

    fn parse_buffer(
        &mut self,
        buffer: &[u8],
        finished: bool,
        events: &mut Vec<ReportEvent>,
    ) -> Result<usize, ReadError> {
        let mut reader = Reader::from_reader(buffer);
        reader.config_mut().trim_text(true);
        // Matching is checked against `self.open`, which spans earlier calls.
        reader.config_mut().check_end_names = false;
        reader.config_mut().allow_unmatched_ends = true;

        let mut consumed = 0usize;
        let mut text = String::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) if finished => return Err(self.malformed(consumed, err.to_string())),
                // Most likely an element the writer is still in the middle of.
                Err(_) => return Ok(consumed),
            };
            let position = reader.buffer_position() as usize;

            match event {
                Event::Eof => break,
                Event::Text(content) => {
                    if position >= buffer.len() && !finished {
                        break;
                    }
                    let content = content
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&content).into_owned());
                    text.push_str(&content);
                    continue;
                }
                Event::CData(content) => {
                    text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                    continue;
                }
                Event::Start(start) => {
                    self.take_text(&mut text);
                    self.open_element(&start, consumed, events)?;
                    self.open.push(start.name().as_ref().to_vec());
                }
                Event::Empty(start) => {
                    self.take_text(&mut text);
                    self.open_element(&start, consumed, events)?;
                    self.close_element(start.name().as_ref(), events);
                    if self.open.is_empty() {
                        self.complete = true;
                    }
                }
                Event::End(end) => {
                    self.take_text(&mut text);
                    let name = end.name().as_ref().to_vec();
                    match self.open.pop() {
                        Some(expected) if expected == name => {}
                        Some(expected) => {
                            return Err(self.malformed(
                                consumed,
                                format!(
                                    "expected </{}>, found </{}>",
                                    String::from_utf8_lossy(&expected),
                                    String::from_utf8_lossy(&name)
                                ),
                            ));
                        }
                        None => {
                            return Err(self.malformed(
                                consumed,
                                format!("unexpected </{}>", String::from_utf8_lossy(&name)),
                            ));
                        }
                    }
                    self.close_element(&name, events);
                    if self.open.is_empty() {
                        self.complete = true;
                    }
                }
                // Declarations, comments and processing instructions carry nothing we use,
                // but text before them is committed along with them.
                _ => self.take_text(&mut text),
            }

            consumed = position;
            if self.complete {
                return Ok(consumed);
            }
        }

        if finished {
            let reason = if self.root_seen {
                "document ended before the root element was closed"
            } else {
                "no test report was written"
            };
            return Err(self.malformed(consumed, reason.to_string()));
        }

        Ok(consumed)
    }

    fn open_element(
        &mut self,
        start: &BytesStart,
        at: usize,
        events: &mut Vec<ReportEvent>,
    ) -> Result<(), ReadError> {
        let name = start.name();
        let name = name.as_ref();

        if !self.root_seen {
            if name != TAG_REPORT && name != TAG_TEST_SUITE {
                return Err(self.malformed(
                    at,
                    format!("unexpected root element <{}>", String::from_utf8_lossy(name)),
                ));
            }
            self.root_seen = true;
        }

        match name {
            TAG_REPORT | TAG_TEST_SUITE => {
                if self.case_open {
                    return Err(self.malformed(at, "test suite inside a test case".to_string()));
                }
                events.push(ReportEvent::SuiteStart(SuiteStart {
                    name: attr(start, b"name").unwrap_or_default(),
                    file: attr(start, b"file"),
                    tests: attr(start, b"tests").and_then(|v| v.trim().parse().ok()),
                }));
            }
            TAG_TEST_CASE => {
                if self.case_open {
                    return Err(self.malformed(at, "nested test case".to_string()));
                }
                self.case_open = true;
                events.push(ReportEvent::CaseStart(CaseStart {
                    name: attr(start, b"name").unwrap_or_default(),
                    class_name: attr(start, b"class").or_else(|| attr(start, b"classname")),
                    file: attr(start, b"file"),
                    line: attr(start, b"line").and_then(|v| v.trim().parse().ok()),
                    time: attr(start, b"time").and_then(|v| parse_seconds(&v)),
                }));
            }
            TAG_FAILURE | TAG_ERROR => {
                let kind = if name == TAG_ERROR {
                    FailureKind::Error
                } else {
                    FailureKind::Failure
                };
                let mut detail = FailureDetail::new(kind);
                detail.failure_type = attr(start, b"type");
                detail.message = attr(start, b"message");
                detail.file = attr(start, b"file");
                detail.line = attr(start, b"line").and_then(|v| v.trim().parse().ok());
                self.failure = Some(detail);
                self.failure_text.clear();
            }
            _ => {}
        }

        Ok(())
    }

    fn close_element(&mut self, name: &[u8], events: &mut Vec<ReportEvent>) {
        match name {
            TAG_REPORT | TAG_TEST_SUITE => events.push(ReportEvent::SuiteEnd),
            TAG_TEST_CASE => {
                self.case_open = false;
                events.push(ReportEvent::CaseEnd);
            }
            TAG_FAILURE | TAG_ERROR => {
                if let Some(mut detail) = self.failure.take() {
                    let text = std::mem::take(&mut self.failure_text);
                    if detail.message.is_none() && !text.is_empty() {
                        detail.message = Some(text);
                    }
                    events.push(ReportEvent::Failure(detail));
                }
            }
            _ => {}
        }
    }

    fn take_text(&mut self, text: &mut String) {
        if self.failure.is_some() {
            self.failure_text.push_str(text);
        }
        text.clear();
    }

    fn malformed(&self, at: usize, reason: String) -> ReadError {
        ReadError::Malformed {
            offset: self.offset + at as u64,
            reason,
        }
    }
}

fn attr(start: &BytesStart, key: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn parse_seconds(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
