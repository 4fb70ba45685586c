//! Chat message and request types shared by every stage of the pipeline.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

/// Role names used by the built-in constructors.
pub mod role {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
}

/// A single chat message.
///
/// Messages are plain values: once a provider has produced one it is only
/// moved or cloned, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(role::SYSTEM, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(role::USER, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(role::ASSISTANT, text)
    }
}

/// Inbound chat completion request (OpenAI-style body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }

    /// Enable streaming mode.
    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Decode and validate a raw JSON body.
    ///
    /// Any decoding failure (bad JSON, missing `model`, wrong field types)
    /// is reported as a validation error.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let req: ChatRequest = serde_json::from_slice(body).map_err(|e| {
            Error::validation_with_context(
                "malformed chat request body",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("request_validator"),
            )
        })?;
        req.validate()?;
        Ok(req)
    }

    /// Check the invariants a request must satisfy before dispatch.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation_with_context(
                "model must not be empty",
                ErrorContext::new()
                    .with_field_path("request.model")
                    .with_source("request_validator"),
            ));
        }
        Ok(())
    }

    /// The active turn, i.e. the last message of the conversation.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
