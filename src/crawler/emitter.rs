//! Result delivery
//!
//! Results leave the coordinator through a [`ResultSink`]: either collected
//! for a batch, or pushed into a bounded channel that backs a [`CrawlStream`].
//! A full channel blocks the coordinator, which stops dispatching until the
//! consumer catches up.

use crate::crawler::result::CrawlResult;
use crate::output::CrawlSummary;
use crate::CrawlError;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// Cloneable signal that stops a running crawl
///
/// Cancelling stops new dispatches immediately; in-flight pages get the
/// configured grace period and are then abandoned.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Destination of emitted results
pub(crate) enum ResultSink {
    Batch(Vec<CrawlResult>),
    Stream(mpsc::Sender<CrawlResult>),
}

impl ResultSink {
    pub(crate) fn batch() -> Self {
        Self::Batch(Vec::new())
    }

    /// Hands one result to the caller
    ///
    /// Returns `false` when the stream consumer is gone; the result is lost
    /// and the crawl should stop.
    pub(crate) async fn emit(&mut self, result: CrawlResult) -> bool {
        match self {
            Self::Batch(results) => {
                results.push(result);
                true
            }
            Self::Stream(tx) => tx.send(result).await.is_ok(),
        }
    }

    /// Resolves when a stream consumer has dropped or closed the stream
    pub(crate) async fn consumer_gone(&self) {
        match self {
            Self::Batch(_) => std::future::pending().await,
            Self::Stream(tx) => tx.closed().await,
        }
    }

    /// Batch results in dispatch order
    pub(crate) fn into_results(self) -> Vec<CrawlResult> {
        match self {
            Self::Batch(mut results) => {
                results.sort_by_key(|r| r.metadata.dispatch_index);
                results
            }
            Self::Stream(_) => Vec::new(),
        }
    }
}

/// Incremental crawl results, in completion order
///
/// The crawl keeps advancing while the stream is consumed, up to the
/// configured buffer. Cancelling (or dropping) the stream stops the crawl;
/// after [`cancel`](Self::cancel) the stream yields nothing more.
pub struct CrawlStream {
    inner: ReceiverStream<CrawlResult>,
    cancel: CancelHandle,
    task: Option<JoinHandle<Result<CrawlSummary, CrawlError>>>,
    closed: bool,
}

impl CrawlStream {
    pub(crate) fn new(
        rx: mpsc::Receiver<CrawlResult>,
        cancel: CancelHandle,
        task: JoinHandle<Result<CrawlSummary, CrawlError>>,
    ) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            cancel,
            task: Some(task),
            closed: false,
        }
    }

    /// Stops the crawl and closes the stream
    pub fn cancel(&mut self) {
        self.closed = true;
        self.inner.close();
        self.cancel.cancel();
    }

    /// Handle that cancels this crawl from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Waits for the crawl to end and returns its summary
    ///
    /// Results not consumed yet are discarded. Coordinator failures, such as
    /// a broken crawl invariant, surface here.
    pub async fn finish(mut self) -> Result<CrawlSummary, CrawlError> {
        while self.inner.next().await.is_some() {}

        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| CrawlError::Coordinator(e.to_string()))?,
            None => Err(CrawlError::Coordinator(
                "crawl task already collected".to_string(),
            )),
        }
    }
}

impl Stream for CrawlStream {
    type Item = CrawlResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        this.inner.poll_next_unpin(cx)
    }
}

impl Drop for CrawlStream {
    fn drop(&mut self) {
        // A crawl that already finished ignores this
        self.cancel.cancel();
    }
}
