//! Record extraction: the concatenated page stream becomes a stream of
//! [`Record`]s.
//!
//! Extraction is incremental — a record is emitted as soon as its array
//! element is complete, without waiting for the rest of the document or for
//! later pages. Top-level keys other than the record array are skipped
//! silently.

use crate::error::{ParseError, Result};
use crate::pipeline::json::ArrayElementScanner;
use crate::types::Record;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

struct ExtractStep<St> {
    input: Pin<Box<St>>,
    scanner: ArrayElementScanner,
    pending: VecDeque<Record>,
    input_done: bool,
}

/// Turn a concatenated page byte stream into a record stream.
///
/// `records_key` names the top-level array in each page document. Malformed
/// input fails the stream with [`ParseError`]; input errors pass through
/// unchanged.
pub fn extract_records<St>(
    input: St,
    records_key: &str,
) -> impl Stream<Item = Result<Record>> + Send + use<St>
where
    St: Stream<Item = Result<Bytes>> + Send + 'static,
{
    let step = ExtractStep {
        input: Box::pin(input),
        scanner: ArrayElementScanner::new(records_key),
        pending: VecDeque::new(),
        input_done: false,
    };
    futures::stream::try_unfold(step, |mut step| async move {
        loop {
            if let Some(record) = step.pending.pop_front() {
                return Ok(Some((record, step)));
            }
            if step.input_done {
                return Ok(None);
            }
            match step.input.next().await {
                Some(chunk) => {
                    for raw in step.scanner.push(&chunk?)? {
                        step.pending.push_back(materialize(&raw)?);
                    }
                }
                None => {
                    step.scanner.finish()?;
                    step.input_done = true;
                }
            }
        }
    })
}

fn materialize(raw: &[u8]) -> Result<Record> {
    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| ParseError::InvalidElement {
            message: e.to_string(),
        })?;
    match value {
        serde_json::Value::Object(fields) => Ok(Record::new(fields)),
        _ => Err(ParseError::NotAnObject {
            snippet: snippet(raw),
        }
        .into()),
    }
}

fn snippet(raw: &[u8]) -> String {
    const MAX: usize = 40;
    let text = String::from_utf8_lossy(raw);
    if text.len() <= MAX {
        text.into_owned()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &text[..cut])
    }
}
