use ai_gateway::pipeline::STREAM_HEADERS;
use ai_gateway::{
    ChatRequest, ChatResponse, Error, Gateway, GatewayConfig, Message, MessageStream, Provider,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Emits a fixed sequence, then optionally keeps producing until cancelled.
struct Script {
    messages: Vec<&'static str>,
    endless: bool,
    hang: bool,
    capacity: usize,
    produced: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl Script {
    fn new(messages: Vec<&'static str>, endless: bool) -> Self {
        Self {
            messages,
            endless,
            hang: false,
            capacity: 2,
            produced: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stay open without producing more once the fixed sequence is sent.
    fn hanging(mut self, capacity: usize) -> Self {
        self.hang = true;
        self.capacity = capacity;
        self
    }
}

struct MarkStopped(Arc<AtomicBool>);

impl Drop for MarkStopped {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for Script {
    fn name(&self) -> &str {
        "script"
    }

    async fn chat(&self, ctx: CancellationToken, _req: &ChatRequest) -> ai_gateway::Result<MessageStream> {
        let messages = self.messages.clone();
        let (endless, hang) = (self.endless, self.hang);
        let produced = Arc::clone(&self.produced);
        let marker = MarkStopped(Arc::clone(&self.stopped));
        Ok(MessageStream::spawn(ctx, self.capacity, move |tx| async move {
            let _marker = marker;
            for text in messages {
                if tx.send(Message::assistant(text)).await.is_err() {
                    return;
                }
                produced.fetch_add(1, Ordering::SeqCst);
            }
            while endless {
                if tx.send(Message::assistant("tick")).await.is_err() {
                    return;
                }
                produced.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            if hang {
                futures::future::pending::<()>().await;
            }
        }))
    }
}

async fn gateway_with(provider: Arc<dyn Provider>) -> Gateway {
    Gateway::builder()
        .without_echo()
        .provider("script", provider)
        .build()
        .await
        .unwrap()
}

fn streaming_body() -> &'static [u8] {
    br#"{"model":"script","stream":true,"messages":[{"role":"user","content":"go"}]}"#
}

#[tokio::test]
async fn test_stream_frames_in_production_order() {
    let gateway = gateway_with(Arc::new(Script::new(vec!["m1", "m2", "m3"], false))).await;
    let ChatResponse::Stream(frames) = gateway
        .chat(streaming_body(), &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected a streaming response");
    };

    let lines: Vec<Message> = frames
        .map(|frame| {
            assert_eq!(frame.last(), Some(&b'\n'));
            serde_json::from_slice(&frame[..frame.len() - 1]).unwrap()
        })
        .collect()
        .await;
    let contents: Vec<_> = lines.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m1", "m2", "m3"]);
    assert!(lines.iter().all(|m| m.role == "assistant"));
}

#[tokio::test]
async fn test_echo_stream_single_frame() {
    let gateway = Gateway::builder().build().await.unwrap();
    let body = br#"{"model":"echo","stream":true,"messages":[{"role":"user","content":"Hello"}]}"#;
    let resp = gateway.chat(body, &CancellationToken::new()).await.unwrap();
    assert!(resp.is_stream());
    let ChatResponse::Stream(frames) = resp else { unreachable!() };

    let frames: Vec<_> = frames.collect().await;
    assert_eq!(frames.len(), 1);
    assert_eq!(
        &frames[0][..],
        b"{\"role\":\"assistant\",\"content\":\"Echo: Hello\"}\n"
    );
    assert_eq!(STREAM_HEADERS[0], ("Content-Type", "text/event-stream"));
}

#[tokio::test]
async fn test_cancelled_request_releases_provider() {
    let provider = Arc::new(Script::new(vec!["first"], true));
    let stopped = Arc::clone(&provider.stopped);
    let produced = Arc::clone(&provider.produced);
    let gateway = gateway_with(provider).await;

    let ctx = CancellationToken::new();
    let ChatResponse::Stream(mut frames) = gateway.chat(streaming_body(), &ctx).await.unwrap() else {
        panic!("expected a streaming response");
    };
    assert!(frames.next().await.is_some());
    assert!(frames.next().await.is_some());

    ctx.cancel();
    let end = tokio::time::timeout(Duration::from_secs(1), async {
        while frames.next().await.is_some() {}
    })
    .await;
    assert!(end.is_ok(), "stream must end after cancellation");

    tokio::time::timeout(Duration::from_secs(1), async {
        while !stopped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("provider task must exit after cancellation");

    let after_cancel = produced.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(produced.load(Ordering::SeqCst), after_cancel);
}

#[tokio::test]
async fn test_client_disconnect_releases_provider() {
    let provider = Arc::new(Script::new(vec![], true));
    let stopped = Arc::clone(&provider.stopped);
    let gateway = gateway_with(provider).await;

    let resp = gateway
        .chat(streaming_body(), &CancellationToken::new())
        .await
        .unwrap();
    let ChatResponse::Stream(mut frames) = resp else {
        panic!("expected a streaming response");
    };
    assert!(frames.next().await.is_some());
    drop(frames);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !stopped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("provider task must exit once the response is dropped");
}

#[tokio::test]
async fn test_upstream_timeout_truncates_stream() {
    let config = GatewayConfig {
        request_timeout_secs: Some(1),
        ..GatewayConfig::default()
    };
    let provider = Arc::new(Script::new(vec!["start"], true));
    let stopped = Arc::clone(&provider.stopped);
    let gateway = Gateway::builder()
        .config(config)
        .without_echo()
        .provider("script", provider)
        .build()
        .await
        .unwrap();

    let ChatResponse::Stream(frames) = gateway
        .chat(streaming_body(), &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected a streaming response");
    };
    let frames: Vec<_> = tokio::time::timeout(Duration::from_secs(3), frames.collect::<Vec<_>>())
        .await
        .expect("timeout must end the stream");
    assert!(!frames.is_empty());

    tokio::time::timeout(Duration::from_secs(1), async {
        while !stopped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("provider task must exit after the timeout");
}

#[tokio::test]
async fn test_streamed_messages_are_accounted() {
    let gateway = gateway_with(Arc::new(Script::new(vec!["abcd", "abcdefgh"], false))).await;
    let ChatResponse::Stream(frames) = gateway
        .chat(streaming_body(), &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected a streaming response");
    };
    assert_eq!(frames.count().await, 2);
    // "go" is 1 prompt token, then 1 + 2 for the frames.
    assert_eq!(gateway.usage().tokens, 4);
}

#[tokio::test]
async fn test_buffered_messages_accounted_after_client_disconnect() {
    let provider = Arc::new(Script::new(vec!["abcd", "abcd", "abcd"], false).hanging(8));
    let produced = Arc::clone(&provider.produced);
    let stopped = Arc::clone(&provider.stopped);
    let gateway = gateway_with(provider).await;

    let body = br#"{"model":"script","stream":true,"messages":[]}"#;
    let ChatResponse::Stream(mut frames) = gateway
        .chat(body, &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected a streaming response");
    };
    assert!(frames.next().await.is_some());
    tokio::time::timeout(Duration::from_secs(1), async {
        while produced.load(Ordering::SeqCst) < 3 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("provider must fill the channel");
    drop(frames);

    assert_eq!(gateway.usage().tokens, 3);
    tokio::time::timeout(Duration::from_secs(1), async {
        while !stopped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("provider task must exit once the response is dropped");
}

#[tokio::test]
async fn test_upstream_timeout_fails_aggregate_with_504() {
    let config = GatewayConfig {
        request_timeout_secs: Some(1),
        ..GatewayConfig::default()
    };
    let gateway = Gateway::builder()
        .config(config)
        .without_echo()
        .provider("script", Arc::new(Script::new(vec!["start"], false).hanging(2)))
        .build()
        .await
        .unwrap();

    let body = br#"{"model":"script","messages":[{"role":"user","content":"go"}]}"#;
    let err = tokio::time::timeout(
        Duration::from_secs(3),
        gateway.chat(body, &CancellationToken::new()),
    )
    .await
    .expect("timeout must end the request")
    .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert_eq!(err.http_status(), 504);
    assert_eq!(err.code().code(), "G3004");
}
