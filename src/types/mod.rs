//! Core data types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and content |
//! | [`ChatRequest`] | Inbound request: model, messages, stream flag |
//!
//! ## Example
//!
//! ```rust
//! use ai_gateway::types::{ChatRequest, Message};
//!
//! let req = ChatRequest::new("echo", vec![Message::user("Hello")]).streaming(true);
//! assert!(req.validate().is_ok());
//! ```

pub mod message;

pub use message::{ChatRequest, Message};
