//! Stream pipeline: turns one chat request into a streamed or aggregated response.
//!
//! # Stream Pipeline
//!
//! ```text
//! ChatRequest → validate → guardrails → Router → Provider::chat → framing
//!                   │           │          │            │             │
//!                 400         400        500          500     stream | aggregate
//! ```
//!
//! Every failure before the provider returns its [`MessageStream`] is
//! reported as an [`Error`] and nothing is written. Once the stream exists:
//!
//! - **Streaming** ([`ChatResponse::Stream`]): each message is forwarded as one
//!   frame (its JSON plus a newline) in the order the provider produced it. A
//!   provider that fails mid-stream simply closes its channel, so the response
//!   ends after the frames already sent.
//! - **Aggregate** ([`ChatResponse::Aggregate`]): all messages are drained in
//!   order into `{"choices": [...]}`.
//!
//! Usage is recorded once for the request's messages (at the input price) as
//! soon as the provider accepts the request, then for every message the
//! provider produces. Messages still buffered in the channel when the request
//! is cancelled or the client disconnects are counted as well.
//!
//! ## Cancellation
//!
//! The provider runs under a child of the caller's token. The child is
//! cancelled when the caller's token is, when the upstream timeout fires, or
//! when the response is dropped or finished, so a disconnected client always
//! stops the provider. An aggregate request that hits the upstream timeout
//! fails with [`Error::Timeout`]; one cancelled by the caller fails with
//! [`Error::Cancelled`].

mod frame;

pub use frame::{encode_frame, AggregateResponse, ModelList, STREAM_HEADERS};

use crate::guardrails::GuardrailEngine;
use crate::provider::MessageStream;
use crate::routing::Router;
use crate::types::ChatRequest;
use crate::usage::{CharacterEstimator, PriceTable, TokenCounter, UsageRecorder, UsageTracker};
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of a successfully dispatched request.
#[derive(Debug)]
pub enum ChatResponse {
    /// Frames to forward as they arrive, with [`STREAM_HEADERS`].
    Stream(FrameStream),
    /// Complete JSON body.
    Aggregate(AggregateResponse),
}

impl ChatResponse {
    pub fn is_stream(&self) -> bool {
        matches!(self, ChatResponse::Stream(_))
    }
}

/// Per-request orchestrator over the shared router, guardrails and usage tracker.
///
/// Cloning is cheap; the pipeline holds no per-request state.
#[derive(Clone)]
pub struct StreamPipeline {
    router: Arc<Router>,
    guardrails: Arc<GuardrailEngine>,
    usage: Arc<UsageTracker>,
    counter: Arc<dyn TokenCounter>,
    prices: Arc<PriceTable>,
    timeout: Option<Duration>,
}

impl StreamPipeline {
    pub fn new(
        router: Arc<Router>,
        guardrails: Arc<GuardrailEngine>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            router,
            guardrails,
            usage,
            counter: Arc::new(CharacterEstimator::new()),
            prices: Arc::new(PriceTable::default()),
            timeout: None,
        }
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = Arc::new(prices);
        self
    }

    /// Cancel the provider if the request runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Run one request through the pipeline.
    ///
    /// `ctx` is the caller's request context; cancelling it stops the
    /// provider and ends a streaming response.
    pub async fn execute(&self, req: ChatRequest, ctx: &CancellationToken) -> Result<ChatResponse> {
        let span = tracing::info_span!(
            "chat",
            request_id = %Uuid::new_v4(),
            model = %req.model,
            stream = req.stream
        );
        self.dispatch(req, ctx, span.clone()).instrument(span).await
    }

    async fn dispatch(
        &self,
        req: ChatRequest,
        ctx: &CancellationToken,
        span: tracing::Span,
    ) -> Result<ChatResponse> {
        req.validate()?;
        self.guardrails.check_request(&req)?;

        let provider = self.router.provider_for(&req.model)?;
        tracing::debug!(provider = provider.name(), "provider resolved");

        let request_ctx = ctx.child_token();
        let guard = request_ctx.clone().drop_guard();
        if let Some(limit) = self.timeout {
            spawn_timeout(request_ctx.clone(), limit);
        }

        let messages = provider
            .chat(request_ctx.clone(), &req)
            .await
            .map_err(|e| match e {
                e @ (Error::Provider { .. } | Error::Cancelled) => e,
                other => Error::provider_with_context(
                    other.to_string(),
                    ErrorContext::new().with_source(provider.name()),
                ),
            })?;

        let recorder = UsageRecorder::new(
            Arc::clone(&self.usage),
            Arc::clone(&self.counter),
            self.prices.unit_price(&req.model),
        )
        .with_input_price(self.prices.input_unit_price(&req.model));
        let prompt_tokens = recorder.record_prompt(&req.messages);
        tracing::debug!(prompt_tokens, "prompt recorded");

        if req.stream {
            return Ok(ChatResponse::Stream(FrameStream::new(
                messages,
                recorder,
                request_ctx,
                guard,
                span,
            )));
        }

        let body = aggregate(messages, &recorder, &request_ctx)
            .await
            .map_err(|e| match (e, self.timeout) {
                // The caller still wants the answer, so the timeout fired.
                (Error::Cancelled, Some(after)) if !ctx.is_cancelled() => Error::Timeout { after },
                (e, _) => e,
            })?;
        tracing::info!(choices = body.choices.len(), "request complete");
        Ok(ChatResponse::Aggregate(body))
    }
}

impl std::fmt::Debug for StreamPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPipeline")
            .field("router", &self.router)
            .field("guardrails", &self.guardrails)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn spawn_timeout(ctx: CancellationToken, limit: Duration) {
    tokio::spawn(
        async move {
            tokio::select! {
                _ = ctx.cancelled() => {}
                _ = tokio::time::sleep(limit) => {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "upstream timeout, cancelling provider");
                    ctx.cancel();
                }
            }
        }
        .in_current_span(),
    );
}

async fn aggregate(
    mut messages: MessageStream,
    recorder: &UsageRecorder,
    ctx: &CancellationToken,
) -> Result<AggregateResponse> {
    let mut choices = Vec::new();
    loop {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                let buffered = drain_buffered(&mut messages, recorder);
                tracing::debug!(
                    received = choices.len(),
                    buffered,
                    "request cancelled while aggregating"
                );
                return Err(Error::Cancelled);
            }
            next = messages.recv() => match next {
                Some(message) => {
                    recorder.record(&message);
                    choices.push(message);
                }
                None => break,
            },
        }
    }
    Ok(AggregateResponse { choices })
}

// Closes the channel and records the messages the provider already produced
// that nobody will read. Returns the tokens recorded.
fn drain_buffered(messages: &mut MessageStream, recorder: &UsageRecorder) -> u64 {
    messages.close();
    let mut tokens = 0;
    while let Some(message) = messages.try_recv() {
        tokens += recorder.record(&message);
    }
    tokens
}

/// Streaming response body: one encoded frame per provider message.
///
/// Dropping the stream cancels the provider. Messages it had already
/// produced are still counted towards usage.
pub struct FrameStream {
    messages: MessageStream,
    recorder: UsageRecorder,
    cancelled: Pin<Box<dyn Future<Output = ()> + Send>>,
    _guard: DropGuard,
    span: tracing::Span,
    frames: usize,
    tokens: u64,
    done: bool,
}

impl FrameStream {
    fn new(
        messages: MessageStream,
        recorder: UsageRecorder,
        ctx: CancellationToken,
        guard: DropGuard,
        span: tracing::Span,
    ) -> Self {
        Self {
            messages,
            recorder,
            cancelled: Box::pin(async move { ctx.cancelled().await }),
            _guard: guard,
            span,
            frames: 0,
            tokens: 0,
            done: false,
        }
    }

    /// Frames forwarded so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn close(&mut self, reason: &'static str) {
        self.done = true;
        self.tokens += drain_buffered(&mut self.messages, &self.recorder);
        tracing::info!(frames = self.frames, tokens = self.tokens, reason, "stream closed");
    }
}

impl Stream for FrameStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        let span = this.span.clone();
        let _entered = span.enter();

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.close("cancelled");
            return Poll::Ready(None);
        }

        match this.messages.poll_next_unpin(cx) {
            Poll::Ready(Some(message)) => {
                this.tokens += this.recorder.record(&message);
                match encode_frame(&message) {
                    Ok(frame) => {
                        this.frames += 1;
                        Poll::Ready(Some(frame))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode frame");
                        this.close("encode error");
                        Poll::Ready(None)
                    }
                }
            }
            Poll::Ready(None) => {
                this.close("provider finished");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        if !self.done {
            let _entered = self.span.enter();
            self.tokens += drain_buffered(&mut self.messages, &self.recorder);
            tracing::debug!(
                frames = self.frames,
                tokens = self.tokens,
                "stream dropped before completion"
            );
        }
    }
}

impl std::fmt::Debug for FrameStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream")
            .field("frames", &self.frames)
            .field("done", &self.done)
            .finish()
    }
}
