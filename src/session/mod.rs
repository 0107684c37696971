//! Streaming, deduplicating iteration over a feed
//!
//! [`FeedSession::stream`] runs two background tasks:
//! - the fetch task owns the cursor, fetches pages one at a time and moves the
//!   cursor to each page's next position
//! - the dedup task owns the set of seen ids, drops records it has already
//!   emitted and forwards the rest to the returned [`FeedStream`]
//!
//! The tasks are joined by a single-slot page channel, so at most one page is
//! fetched ahead of the one being emitted. Dropping the [`FeedStream`] stops
//! both tasks; no further requests are made after that.

use crate::cursor::FeedCursor;
use crate::error::Result;
use crate::types::Record;
use futures::Stream;
use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Pages buffered between the fetch and dedup tasks
const PAGE_CHANNEL_CAPACITY: usize = 1;
/// Records buffered ahead of the consumer
const OUTPUT_CHANNEL_CAPACITY: usize = 5;

/// How many pages a stream fetches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageLimit {
    /// Follow next positions until the feed ends
    #[default]
    All,
    /// Fetch only the page at the cursor's current position
    SinglePage,
}

/// Iteration context over one feed
///
/// A session never emits the same record id twice. The set of seen ids lives
/// only as long as the session's stream and is not persisted.
#[derive(Debug)]
pub struct FeedSession<C> {
    cursor: C,
    seen: HashSet<u64>,
}

impl<C: FeedCursor> FeedSession<C> {
    /// Create a session reading from `cursor`
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            seen: HashSet::new(),
        }
    }

    /// Start streaming records
    ///
    /// Records are yielded in page order, and in document order within a page.
    /// A fetch or extraction failure is yielded once as an error, after which
    /// the stream ends. When only a page's next position is unreadable, its
    /// records are yielded first; with [`PageLimit::SinglePage`] the position
    /// is never needed and no error is yielded.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn stream(self, limit: PageLimit) -> FeedStream {
        let (page_tx, page_rx) = mpsc::channel(PAGE_CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let (position_tx, position_rx) = watch::channel(self.cursor.position().to_string());
        let cancel = CancellationToken::new();

        tokio::spawn(fetch_pages(
            self.cursor,
            limit,
            page_tx,
            position_tx,
            cancel.clone(),
        ));
        tokio::spawn(dedup_records(self.seen, page_rx, out_tx, cancel));

        FeedStream {
            records: ReceiverStream::new(out_rx),
            position: position_rx,
        }
    }
}

/// Records produced by [`FeedSession::stream`]
#[derive(Debug)]
pub struct FeedStream {
    records: ReceiverStream<Result<Record>>,
    position: watch::Receiver<String>,
}

impl FeedStream {
    /// Position of the next page the stream would fetch
    ///
    /// Starts as the cursor's initial position and is updated each time the
    /// cursor moves. Persist it to later resume with a cursor built via
    /// `resume_at`.
    pub fn position(&self) -> String {
        self.position.borrow().clone()
    }
}

impl Stream for FeedStream {
    type Item = Result<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().records).poll_next(cx)
    }
}

/// Fetch task: owns the cursor
async fn fetch_pages<C: FeedCursor>(
    mut cursor: C,
    limit: PageLimit,
    page_tx: mpsc::Sender<Result<Vec<Record>>>,
    position_tx: watch::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Fetch cancelled while waiting for a page");
                return;
            }
            result = cursor.fetch_page() => result,
        };

        let (records, next) = match result {
            Ok(page) => page.into_parts(),
            Err(e) => {
                hand_over(&page_tx, &cancel, Err(e)).await;
                debug!("Fetch failed, stopping");
                return;
            }
        };

        if !hand_over(&page_tx, &cancel, Ok(records)).await {
            return;
        }
        if limit == PageLimit::SinglePage {
            debug!("Single page fetched, stopping");
            return;
        }

        // A page's records are handed over before its position failure.
        let next = match next {
            Ok(next) => next.unwrap_or_default(),
            Err(e) => {
                hand_over(&page_tx, &cancel, Err(e)).await;
                debug!("Next position unreadable, stopping");
                return;
            }
        };
        if !cursor.seek(&next) {
            debug!("No further position, end of feed");
            return;
        }
        position_tx.send_replace(next);
    }
}

/// Send one result to the dedup task unless the session is cancelled first
///
/// Returns false if the result was not delivered.
async fn hand_over(
    page_tx: &mpsc::Sender<Result<Vec<Record>>>,
    cancel: &CancellationToken,
    result: Result<Vec<Record>>,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Fetch cancelled while handing over a page");
            false
        }
        sent = page_tx.send(result) => sent.is_ok(),
    }
}

/// Dedup task: owns the seen set and cancels the fetch task when it exits
async fn dedup_records(
    mut seen: HashSet<u64>,
    mut page_rx: mpsc::Receiver<Result<Vec<Record>>>,
    out_tx: mpsc::Sender<Result<Record>>,
    cancel: CancellationToken,
) {
    let _cancel_on_exit = cancel.drop_guard();

    loop {
        let result = tokio::select! {
            _ = out_tx.closed() => {
                debug!("Stream dropped by consumer");
                return;
            }
            received = page_rx.recv() => match received {
                Some(result) => result,
                None => return,
            },
        };

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                // The consumer may already be gone, nothing else to do either way.
                let _ = out_tx.send(Err(e)).await;
                return;
            }
        };

        if records.is_empty() {
            debug!("Empty page, end of feed");
            return;
        }

        for record in records {
            if !seen.insert(record.id) {
                debug!(
                    record_id = record.id,
                    timestamp = ?record.timestamp,
                    "Duplicate record"
                );
                continue;
            }
            if out_tx.send(Ok(record)).await.is_err() {
                debug!("Stream dropped by consumer");
                return;
            }
        }
    }
}
