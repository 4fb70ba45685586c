//! Wire framing for chat responses.

use crate::registry::Model;
use crate::types::Message;
use crate::Result;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Headers for a streaming response.
pub const STREAM_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "text/event-stream"),
    ("Cache-Control", "no-cache"),
];

/// Encode one message as a frame: its JSON followed by a newline.
pub fn encode_frame(message: &Message) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(message.content.len() + 32).writer();
    serde_json::to_writer(&mut buf, message)?;
    let mut buf = buf.into_inner();
    buf.put_u8(b'\n');
    Ok(buf.freeze())
}

/// Body of a non-streaming response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub choices: Vec<Message>,
}

/// Body of the model listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<Model>,
}
