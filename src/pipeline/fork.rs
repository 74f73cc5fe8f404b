//! Response forking: one live page body duplicated into two independently
//! consumable byte streams.
//!
//! The control fork feeds pagination bookkeeping; the data fork feeds record
//! extraction. A pump task reads the source body exactly once and forwards
//! every chunk to both forks.
//!
//! Queuing policy: one unbounded queue per fork. The pump never waits for a
//! slow fork, so neither reader can starve or drop bytes destined for the
//! other. Growth is bounded in practice by a single page body, because pages
//! are fetched strictly sequentially and a page's forks are drained (or
//! dropped) before the next fetch is issued. Dropping a fork's receiver is an
//! explicit discard; the other fork is unaffected. Once both receivers are
//! gone the pump stops reading, which aborts the underlying transfer.
//!
//! A mid-body transport error is parked in a shared failure slot and both
//! queues are closed; [`ForkStream::take_failure`] retrieves it, and the data
//! stream surfaces it after replaying every byte received before the failure.

use crate::error::{Error, FetchError};
use crate::pipeline::fetch::PageBody;
use crate::pipeline::sequence::PageData;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type FailureSlot = Arc<Mutex<Option<FetchError>>>;

/// One fork of a page body.
///
/// Yields the body's chunks in order and ends when the body ends, cleanly or
/// not. After the stream ends, [`take_failure`](Self::take_failure) tells the
/// two ends of the pipeline apart.
pub struct ForkStream {
    rx: UnboundedReceiverStream<Bytes>,
    failure: FailureSlot,
}

impl ForkStream {
    /// Take the transport error that ended the body, if there was one.
    ///
    /// Returns `Some` at most once across both forks.
    pub fn take_failure(&self) -> Option<FetchError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Convert this fork into a data-path stream that surfaces the parked
    /// failure as its final item.
    pub fn into_data_stream(self) -> PageData {
        futures::stream::unfold(Some(self), |state| async move {
            let mut fork = state?;
            match fork.next().await {
                Some(chunk) => Some((Ok(chunk), Some(fork))),
                None => fork
                    .take_failure()
                    .map(|e| (Err(Error::from(e)), None)),
            }
        })
        .boxed()
    }
}

impl Stream for ForkStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().rx).poll_next(cx)
    }
}

/// The two forks of one page body.
pub struct ForkedPage {
    /// Fork consumed by pagination bookkeeping
    pub control: ForkStream,
    /// Fork consumed by record extraction
    pub data: ForkStream,
}

/// Fork a page body into a control stream and a data stream.
///
/// Both forks replay the body's exact bytes in order. The body is read by a
/// spawned pump task and dropped as soon as it ends or both forks are gone.
pub fn fork(body: PageBody) -> ForkedPage {
    let failure: FailureSlot = Arc::new(Mutex::new(None));
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (data_tx, data_rx) = mpsc::unbounded_channel();

    tokio::spawn(pump(body, control_tx, data_tx, failure.clone()));

    ForkedPage {
        control: ForkStream {
            rx: UnboundedReceiverStream::new(control_rx),
            failure: failure.clone(),
        },
        data: ForkStream {
            rx: UnboundedReceiverStream::new(data_rx),
            failure,
        },
    }
}

async fn pump(
    mut body: PageBody,
    control: mpsc::UnboundedSender<Bytes>,
    data: mpsc::UnboundedSender<Bytes>,
    failure: FailureSlot,
) {
    while let Some(item) = body.next().await {
        match item {
            Ok(chunk) => {
                // Bytes clones are reference-counted; no payload copy here.
                let control_open = control.send(chunk.clone()).is_ok();
                let data_open = data.send(chunk).is_ok();
                if !control_open && !data_open {
                    return;
                }
            }
            Err(e) => {
                *failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
                return;
            }
        }
    }
}
