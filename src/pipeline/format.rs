//! Row formatting: records become delimiter-joined text rows.
//!
//! The header row is emitted exactly once, before any data row and before
//! the first page is even requested — the first bytes of an export flush as
//! soon as the client starts reading. Values are written unquoted and
//! unescaped; see [`CsvConfig`](crate::config::CsvConfig) for the
//! implications.

use crate::config::CsvConfig;
use crate::error::Result;
use crate::types::Record;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Renders records as CSV rows with a fixed field order.
///
/// Formatting is pure: the same record always renders to byte-identical
/// output, and no state is carried between rows.
#[derive(Clone, Debug)]
pub struct RowFormatter {
    fields: Vec<String>,
    delimiter: String,
    terminator: String,
}

impl RowFormatter {
    /// Build a formatter from CSV configuration.
    pub fn new(csv: &CsvConfig) -> Self {
        Self {
            fields: csv.fields.clone(),
            delimiter: csv.delimiter.clone(),
            terminator: csv.row_terminator.clone(),
        }
    }

    /// The header row: field names joined by the delimiter.
    pub fn header(&self) -> Bytes {
        let mut line = self.fields.join(&self.delimiter);
        line.push_str(&self.terminator);
        Bytes::from(line)
    }

    /// One data row for a record, fields in configured order.
    ///
    /// Missing fields render as empty text between delimiters.
    pub fn row(&self, record: &Record) -> Bytes {
        let mut line = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push_str(&self.delimiter);
            }
            line.push_str(&record.field(field));
        }
        line.push_str(&self.terminator);
        Bytes::from(line)
    }
}

struct FormatStep<St> {
    records: Pin<Box<St>>,
    formatter: RowFormatter,
    header_sent: bool,
}

/// Turn a record stream into a CSV byte stream: header first, then one row
/// per record in arrival order. No record is buffered beyond the row being
/// rendered.
pub fn format_rows<St>(records: St, formatter: RowFormatter) -> impl Stream<Item = Result<Bytes>> + Send
where
    St: Stream<Item = Result<Record>> + Send + 'static,
{
    let step = FormatStep {
        records: Box::pin(records),
        formatter,
        header_sent: false,
    };
    futures::stream::try_unfold(step, |mut step| async move {
        if !step.header_sent {
            step.header_sent = true;
            let header = step.formatter.header();
            return Ok(Some((header, step)));
        }
        match step.records.next().await {
            Some(record) => {
                let row = step.formatter.row(&record?);
                Ok(Some((row, step)))
            }
            None => Ok(None),
        }
    })
}
