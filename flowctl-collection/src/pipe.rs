use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::stream::{Stream, StreamExt};

use flowctl::error::{Error, Result};

/// Creates a connected push-stream pair: a producer handle and the
/// single consumer that drains it in FIFO order.
///
/// Sends never apply backpressure; values queue until pulled.
///
/// ```rust
/// use flowctl_collection::pipe::pipe;
///
/// let (tx, mut rx) = pipe();
/// tx.send("chunk").unwrap();
/// tx.close();
/// futures::executor::block_on(async {
///     assert_eq!(rx.next().await, Some("chunk"));
///     assert_eq!(rx.next().await, None);
/// });
/// ```
pub fn pipe<T>() -> (PipeSender<T>, PipeReceiver<T>) {
    let (tx, rx) = unbounded();
    (PipeSender { tx }, PipeReceiver { rx })
}

/// Producer half of a pipe.
pub struct PipeSender<T> {
    tx: UnboundedSender<T>,
}

impl<T> Clone for PipeSender<T> {
    fn clone(&self) -> Self {
        PipeSender { tx: self.tx.clone() }
    }
}

impl<T> PipeSender<T> {
    /// Enqueues one value for the reader.
    pub fn send(&self, value: T) -> Result<()> {
        self.tx.unbounded_send(value).map_err(|_| Error::StreamClosed)
    }

    /// Ends the stream; queued values remain readable, further sends
    /// fail.  Idempotent.
    pub fn close(&self) {
        self.tx.close_channel();
    }
}

/// Consumer half of a pipe.  Exactly one reader, strict FIFO.
pub struct PipeReceiver<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> PipeReceiver<T> {
    /// Pulls the next value, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.next().await
    }
}

impl<T> Stream for PipeReceiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}
