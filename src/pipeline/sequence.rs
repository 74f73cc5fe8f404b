//! Page sequencing: a pull protocol for obtaining page streams in order and
//! concatenating them into one logical byte stream.
//!
//! The producer side answers "next stream, or none" on demand; the sequencer
//! guarantees that only one page stream is open at a time, that the next
//! stream is not requested until the current one is fully drained, and that
//! a `None` answer closes the logical output. The resulting sequence is
//! finite and not restartable.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// One page's data-path stream.
pub type PageData = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Produces page streams on demand, in page order.
///
/// `next_stream` is only called after the previously returned stream has
/// been drained, so implementations may perform per-page work (fetching,
/// bookkeeping) inside it without risking overlap.
#[async_trait]
pub trait StreamSource: Send {
    /// The next page's stream, `None` when there are no more pages, or an
    /// error that ends the sequence.
    async fn next_stream(&mut self) -> Result<Option<PageData>>;
}

enum SequenceStep<S> {
    Between(S),
    Draining(S, PageData),
}

/// Concatenate a source's streams end-to-end.
///
/// Bytes of page *k* are fully emitted before any byte of page *k+1*;
/// nothing is inserted or dropped at page boundaries. The first error from
/// the source or from a page stream ends the output.
pub fn sequence<S>(source: S) -> impl Stream<Item = Result<Bytes>> + Send
where
    S: StreamSource + 'static,
{
    futures::stream::try_unfold(SequenceStep::Between(source), |mut step| async move {
        loop {
            step = match step {
                SequenceStep::Between(mut source) => match source.next_stream().await? {
                    Some(stream) => SequenceStep::Draining(source, stream),
                    None => return Ok(None),
                },
                SequenceStep::Draining(source, mut stream) => match stream.next().await {
                    Some(chunk) => {
                        return Ok(Some((chunk?, SequenceStep::Draining(source, stream))));
                    }
                    None => SequenceStep::Between(source),
                },
            };
        }
    })
}
