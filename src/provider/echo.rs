use super::{MessageStream, Provider, DEFAULT_CHANNEL_CAPACITY};
use crate::types::{ChatRequest, Message};
use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Responds by echoing the last message of the request.
#[derive(Debug, Clone)]
pub struct EchoProvider {
    capacity: usize,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Use a channel of `capacity` messages (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn chat(&self, ctx: CancellationToken, req: &ChatRequest) -> Result<MessageStream> {
        let reply = req
            .last_message()
            .map(|last| Message::assistant(format!("Echo: {}", last.content)));

        Ok(MessageStream::spawn(ctx, self.capacity, |tx| async move {
            if let Some(reply) = reply {
                let _ = tx.send(reply).await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_echo_last_message() {
        let req = ChatRequest::new(
            "echo",
            vec![Message::user("first"), Message::user("Hello")],
        );
        let stream = EchoProvider::new()
            .chat(CancellationToken::new(), &req)
            .await
            .unwrap();
        let out: Vec<Message> = stream.collect().await;
        assert_eq!(out, vec![Message::assistant("Echo: Hello")]);
    }

    #[tokio::test]
    async fn test_echo_without_messages_closes_immediately() {
        let req = ChatRequest::new("echo", Vec::new());
        let stream = EchoProvider::new()
            .chat(CancellationToken::new(), &req)
            .await
            .unwrap();
        let out: Vec<Message> = stream.collect().await;
        assert!(out.is_empty());
    }
}
