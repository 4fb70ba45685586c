//! Channel-backed message stream returned by providers.

use crate::types::Message;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default capacity of the bounded provider channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Finite, single-consumer sequence of messages produced by a provider task.
///
/// The stream ends when the producer finishes, fails, or is cancelled.
/// Dropping the stream aborts the producer task.
pub struct MessageStream {
    rx: mpsc::Receiver<Message>,
    task: Option<JoinHandle<()>>,
}

impl MessageStream {
    /// Spawn `produce` on the runtime and return the stream it feeds.
    ///
    /// The producer future races against `ctx`: once the token is cancelled
    /// the future is dropped, which drops its sender and closes the channel.
    pub fn spawn<F, Fut>(ctx: CancellationToken, capacity: usize, produce: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Message>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let producer = produce(tx);
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    tracing::debug!("provider task cancelled");
                }
                _ = producer => {}
            }
        });
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Wrap an already populated receiver (no background task).
    pub fn from_receiver(rx: mpsc::Receiver<Message>) -> Self {
        Self { rx, task: None }
    }

    /// A stream that yields nothing.
    pub fn empty() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self::from_receiver(rx)
    }

    /// Receive the next message, `None` once the producer has closed.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Take a message that is already buffered without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    /// Refuse further messages from the producer. Buffered messages stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Whether the producer task has finished (or there never was one).
    pub fn is_producer_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("producer_finished", &self.is_producer_finished())
            .finish()
    }
}
