//! The paginated-fetch streaming pipeline, split into focused stages:
//! - [`fetch`] - one HTTP request per page, body as a live byte stream
//! - [`fork`] - each page body duplicated into control and data forks
//! - [`pagination`] - pagination cursor and control-path scanning
//! - [`sequence`] - pull protocol concatenating page streams in order
//! - [`extract`] - incremental record extraction from the concatenated stream
//! - [`format`] - CSV rendering, header once then one row per record
//!
//! Stages are pull-driven all the way down: the sink's demand is what makes
//! the formatter pull a record, the extractor pull bytes, the sequencer open
//! the next page, and the fetcher issue the next request. A consumer that
//! stops reading therefore suspends the whole pipeline, network included,
//! with at most one page buffered. Dropping the output stream cancels the
//! in-flight fetch and releases both forks of the open page.

pub mod extract;
pub mod fetch;
pub mod fork;
pub mod format;
mod json;
pub mod pagination;
pub mod sequence;

use crate::config::Config;
use crate::error::{Error, Result, SinkError};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use extract::extract_records;
use fetch::PageFetcher;
use fork::{ForkedPage, fork};
use format::{RowFormatter, format_rows};
use pagination::{PaginationState, find_total_pages};
use sequence::{PageData, StreamSource, sequence};

/// Pull-protocol source that walks a paged API page by page.
///
/// Each call fetches the page the cursor points at, forks the response,
/// scans the control fork for the total page count, advances the cursor, and
/// hands the data fork downstream. The next page's fetch cannot begin before
/// the previous page's pagination decision has been made, so there is never
/// more than one request in flight and never a speculative fetch.
pub struct PagedSource {
    fetcher: Arc<dyn PageFetcher>,
    state: PaginationState,
    total_pages_key: String,
    throttle: Option<Duration>,
}

impl PagedSource {
    /// Create a source starting at page 1.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            state: PaginationState::new(),
            total_pages_key: config.source.total_pages_key.clone(),
            throttle: config.source.page_delay_ms.map(Duration::from_millis),
        }
    }

    /// The pagination cursor, for inspection.
    pub fn state(&self) -> &PaginationState {
        &self.state
    }
}

#[async_trait::async_trait]
impl StreamSource for PagedSource {
    async fn next_stream(&mut self) -> Result<Option<PageData>> {
        let Some(page) = self.state.next_to_fetch() else {
            tracing::debug!(total_pages = ?self.state.total_pages(), "pagination complete");
            return Ok(None);
        };

        let body = self.fetcher.fetch(page).await?;
        let ForkedPage { mut control, data } = fork(body);

        let total = match find_total_pages(&mut control, page, &self.total_pages_key).await {
            Ok(total) => total,
            // A transport failure mid-body shows up on the control path as a
            // truncated stream; the parked transport error is the real cause.
            Err(e) => return Err(data.take_failure().map(Error::from).unwrap_or(e)),
        };
        drop(control);

        self.state.record_total(total);
        self.state.advance();
        tracing::debug!(%page, total_pages = total, "page forked, pagination decided");

        if self.state.has_more()
            && let Some(delay) = self.throttle
        {
            tokio::time::sleep(delay).await;
        }

        Ok(Some(data.into_data_stream()))
    }
}

/// Build the full export pipeline: a CSV byte stream over every record of
/// every page.
///
/// The stream is lazy — nothing is fetched until it is polled — and
/// incremental: rows are emitted as records complete, not after the result
/// set is materialized. The first error from any stage ends the stream.
pub fn csv_stream(
    fetcher: Arc<dyn PageFetcher>,
    config: &Config,
) -> impl Stream<Item = Result<Bytes>> + Send + use<> {
    let source = PagedSource::new(fetcher, config);
    let pages = sequence(source);
    let records = extract_records(pages, &config.source.records_key);
    format_rows(records, RowFormatter::new(&config.csv))
}

/// Drive a pipeline stream into an async sink, flushing per chunk.
///
/// Returns the number of bytes written. A sink failure maps to
/// [`SinkError`] and drops the stream, which cancels the in-flight fetch
/// and any open page forks; no further pages are requested.
pub async fn write_to<St, W>(stream: St, sink: &mut W) -> Result<u64>
where
    St: Stream<Item = Result<Bytes>> + Send,
    W: AsyncWrite + Unpin,
{
    let mut stream = Box::pin(stream);
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk).await.map_err(SinkError::from_io)?;
        sink.flush().await.map_err(SinkError::from_io)?;
        written += chunk.len() as u64;
    }
    Ok(written)
}
