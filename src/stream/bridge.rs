//! The cursor-to-channel streaming bridge.
//!
//! One producer task per stream drains a [`Cursor`] and publishes owned
//! items onto a bounded channel; the consumer receives them in exact cursor
//! order. A full channel suspends the producer (backpressure); a dropped
//! consumer closes the channel, which the producer observes before its next
//! publish, releasing the native cursor instead of blocking forever.
//!
//! Per-stream lifecycle: `Created -> Draining -> {Exhausted, Faulted,
//! Cancelled} -> Closed`. No path skips cursor release: it is tied to the
//! cursor's drop at the end of the drain task.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};

use super::cursor::Cursor;
use crate::error::RdfResult;

/// The consuming end of one result stream.
///
/// Items arrive in cursor order; the channel closes after the last item. A
/// stream fault is delivered as a terminal `Err` item on the same channel.
/// Dropping the `ItemStream` before exhaustion cancels the producer.
#[derive(Debug)]
pub struct ItemStream<T> {
    rx: mpsc::Receiver<RdfResult<T>>,
}

impl<T> ItemStream<T> {
    /// Receive the next item, or `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<RdfResult<T>> {
        self.rx.recv().await
    }

    /// Close the stream early; the producer stops at its next publish.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Adapt into a [`tokio_stream::Stream`] for combinator-style use.
    pub fn into_stream(self) -> ReceiverStream<RdfResult<T>> {
        ReceiverStream::new(self.rx)
    }
}

/// Spawn a producer task draining `cursor` into a bounded channel.
///
/// `capacity` bounds how many produced-but-unconsumed items may accumulate.
/// Zero requests a fully synchronous hand-off; the channel's tightest
/// setting, a single in-flight item, is used for it. Must be called within a
/// Tokio runtime.
pub(crate) fn stream<C>(cursor: C, capacity: usize) -> ItemStream<C::Item>
where
    C: Cursor,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(drain(cursor, tx));
    ItemStream { rx }
}

async fn drain<C>(mut cursor: C, tx: mpsc::Sender<RdfResult<C::Item>>)
where
    C: Cursor,
{
    debug!("result stream draining");
    loop {
        // Poll for cancellation before each blocking copy-out and publish.
        if tx.is_closed() {
            debug!("result stream cancelled: consumer gone");
            break;
        }
        if cursor.is_exhausted() {
            debug!("result stream exhausted");
            break;
        }
        match cursor.current() {
            Ok(item) => {
                if tx.send(Ok(item)).await.is_err() {
                    warn!("result stream cancelled: consumer dropped mid-publish");
                    break;
                }
            }
            Err(err) => {
                error!(%err, "result stream faulted");
                let _ = tx.send(Err(err)).await;
                break;
            }
        }
        cursor.advance();
    }
    // Dropping the cursor releases the native resource; dropping the sender
    // closes the channel. Both happen on every exit path.
    drop(cursor);
    debug!("result stream closed");
}
