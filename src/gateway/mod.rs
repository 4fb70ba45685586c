//! Gateway facade: the single entry point a front end talks to.
//!
//! A [`Gateway`] wires the model registry, router, guardrails and usage
//! tracker into one [`StreamPipeline`] and exposes the operations the HTTP
//! layer needs: chat dispatch from a raw body, model listing, registry reload
//! and usage readout.
//!
//! ```rust,no_run
//! use ai_gateway::{ChatResponse, Gateway};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> ai_gateway::Result<()> {
//! let gateway = Gateway::builder().build().await?;
//! let body = br#"{"model":"echo","messages":[{"role":"user","content":"Hello"}]}"#;
//! match gateway.chat(body, &CancellationToken::new()).await? {
//!     ChatResponse::Aggregate(resp) => println!("{}", serde_json::to_string(&resp)?),
//!     ChatResponse::Stream(_) => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{GatewayBuilder, ECHO_MODEL};

use crate::config::GatewayConfig;
use crate::pipeline::{ChatResponse, ModelList, StreamPipeline};
use crate::provider::Provider;
use crate::registry::{ModelRegistry, ModelWatcher};
use crate::routing::Router;
use crate::types::ChatRequest;
use crate::usage::UsageCounter;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Request dispatch core shared by all connections.
pub struct Gateway {
    config: GatewayConfig,
    pipeline: StreamPipeline,
    registry: Arc<ModelRegistry>,
    _watcher: Option<ModelWatcher>,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    pub async fn from_config(config: GatewayConfig) -> Result<Self> {
        GatewayBuilder::new().config(config).build().await
    }

    /// Decode a raw JSON body and dispatch it.
    pub async fn chat(&self, body: &[u8], ctx: &CancellationToken) -> Result<ChatResponse> {
        let req = ChatRequest::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "rejecting malformed request body");
            e
        })?;
        self.chat_request(req, ctx).await
    }

    pub async fn chat_request(&self, req: ChatRequest, ctx: &CancellationToken) -> Result<ChatResponse> {
        self.pipeline.execute(req, ctx).await
    }

    /// Current model list, in registry order.
    pub fn list_models(&self) -> ModelList {
        ModelList {
            models: self.registry.list(),
        }
    }

    /// Reload the registry from the configured model source.
    pub async fn reload_models(&self) -> Result<usize> {
        let path = self.config.models_path.as_ref().ok_or_else(|| {
            Error::configuration_with_context(
                "no model source configured",
                ErrorContext::new()
                    .with_field_path("models_path")
                    .with_source("gateway"),
            )
        })?;
        self.registry.load_file(path).await
    }

    /// Register an additional provider at runtime.
    pub fn register(&self, model_id: impl Into<String>, provider: Arc<dyn Provider>) {
        self.pipeline.router().register(model_id, provider);
    }

    pub fn usage(&self) -> UsageCounter {
        self.pipeline.usage().snapshot()
    }

    pub fn router(&self) -> &Arc<Router> {
        self.pipeline.router()
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("address", &self.config.address)
            .field("pipeline", &self.pipeline)
            .field("watching", &self._watcher.is_some())
            .finish()
    }
}
