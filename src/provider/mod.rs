//! Provider abstraction: a backend that turns a chat request into a message stream.
//!
//! # Provider Module
//!
//! A [`Provider`] receives a validated [`ChatRequest`] plus the request's
//! cancellation token and returns a [`MessageStream`]. The call itself only
//! schedules production; messages are produced by a background task that
//! feeds a bounded channel and closes it when generation ends.
//!
//! ## Contract
//!
//! - `chat` must not block beyond spawning the producer.
//! - A synchronous `Err` aborts the request before any stream exists.
//! - Failures after the stream exists are reported by closing it early.
//! - When the token is cancelled the producer stops promptly and its task
//!   exits; [`MessageStream::spawn`] enforces this for implementations that
//!   use it.
//!
//! ## Variants
//!
//! | Provider | Description |
//! |----------|-------------|
//! | [`EchoProvider`] | Reference implementation that echoes the last message |

mod echo;
mod stream;

pub use echo::EchoProvider;
pub use stream::{MessageStream, DEFAULT_CHANNEL_CAPACITY};

use crate::types::ChatRequest;
use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A backend capable of producing a chat-style message stream.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Start generating a response for `req`.
    async fn chat(&self, ctx: CancellationToken, req: &ChatRequest) -> Result<MessageStream>;
}
