//! # ai-gateway
//!
//! Request-dispatch core of an AI proxy gateway: accepts OpenAI-style chat
//! requests, screens them with input guardrails, routes them to a provider by
//! model identifier and returns the provider's messages either as a stream of
//! JSON frames or as one aggregated body, while accounting tokens and cost.
//!
//! ## Request Flow
//!
//! ```text
//! body → ChatRequest → GuardrailEngine → Router → Provider → StreamPipeline
//!                                                    │              │
//!                                              MessageStream   frames | {"choices"}
//!                                                                   │
//!                                                             UsageTracker
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_gateway::{ChatResponse, Gateway, GatewayConfig};
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> ai_gateway::Result<()> {
//!     let gateway = Gateway::from_config(GatewayConfig::from_env()).await?;
//!
//!     let body = br#"{"model":"echo","stream":true,"messages":[{"role":"user","content":"Hi"}]}"#;
//!     if let ChatResponse::Stream(mut frames) = gateway.chat(body, &CancellationToken::new()).await? {
//!         while let Some(frame) = frames.next().await {
//!             print!("{}", String::from_utf8_lossy(&frame));
//!         }
//!     }
//!     println!("usage: {:?}", gateway.usage());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Messages and chat requests |
//! | [`provider`] | Provider trait, message streams, echo provider |
//! | [`guardrails`] | Staged input policy checks |
//! | [`registry`] | Hot-reloadable model list and file watcher |
//! | [`routing`] | Model identifier → provider resolution, model selection |
//! | [`usage`] | Token and cost accounting |
//! | [`pipeline`] | Per-request orchestration and response framing |
//! | [`gateway`] | Facade and builder wiring everything together |
//! | [`config`] | YAML configuration with environment overrides |

pub mod config;
pub mod error_code;
pub mod gateway;
pub mod guardrails;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod routing;
pub mod types;
pub mod usage;

pub use config::GatewayConfig;
pub use error_code::GatewayErrorCode;
pub use gateway::{Gateway, GatewayBuilder};
pub use pipeline::{AggregateResponse, ChatResponse, FrameStream, ModelList, StreamPipeline};
pub use provider::{EchoProvider, MessageStream, Provider};
pub use registry::{Model, ModelRegistry};
pub use routing::Router;
pub use types::{ChatRequest, Message};
pub use usage::{UsageCounter, UsageTracker};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
