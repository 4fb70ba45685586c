use super::Gateway;
use crate::config::GatewayConfig;
use crate::guardrails::GuardrailEngine;
use crate::pipeline::StreamPipeline;
use crate::provider::{EchoProvider, Provider};
use crate::registry::{Model, ModelRegistry, ModelWatcher};
use crate::routing::{Router, SelectionStrategy};
use crate::usage::{CharacterEstimator, PriceTable, TokenCounter, UsageTracker};
use crate::Result;
use std::sync::Arc;

/// Identifier the built-in echo provider is registered under.
pub const ECHO_MODEL: &str = "echo";

/// Builder for [`Gateway`].
///
/// By default the echo provider is registered first, which makes it the
/// default provider for unknown models.
pub struct GatewayBuilder {
    config: GatewayConfig,
    providers: Vec<(String, Arc<dyn Provider>)>,
    echo: bool,
    guardrails: Option<GuardrailEngine>,
    token_counter: Option<Arc<dyn TokenCounter>>,
    strategy: Option<Box<dyn SelectionStrategy>>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            providers: Vec::new(),
            echo: true,
            guardrails: None,
            token_counter: None,
            strategy: None,
        }
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Register `provider` under `model_id`, after the echo provider.
    pub fn provider(mut self, model_id: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.providers.push((model_id.into(), provider));
        self
    }

    /// Skip the echo provider; the first [`provider`](Self::provider) becomes the default.
    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Use a prebuilt engine instead of the configured one.
    pub fn guardrails(mut self, engine: GuardrailEngine) -> Self {
        self.guardrails = Some(engine);
        self
    }

    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = Some(counter);
        self
    }

    pub fn selection_strategy(mut self, strategy: Box<dyn SelectionStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build the gateway.
    ///
    /// Loads the model source when `models_path` is set and starts the file
    /// watcher when `watch_models` is on; otherwise the registry starts with
    /// the echo model. Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<Gateway> {
        let config = self.config;

        let registry = Arc::new(ModelRegistry::new());
        match &config.models_path {
            Some(path) => {
                registry.load_file(path).await?;
            }
            None => {
                if self.echo {
                    registry.store(vec![Model::new(ECHO_MODEL, 1)]);
                }
            }
        }

        let mut router = Router::new(Arc::clone(&registry));
        if let Some(strategy) = self.strategy {
            router = router.with_strategy(strategy);
        }
        if self.echo {
            router.register(
                ECHO_MODEL,
                Arc::new(EchoProvider::with_capacity(config.channel_capacity)),
            );
        }
        for (model_id, provider) in self.providers {
            router.register(model_id, provider);
        }
        let router = Arc::new(router);

        let guardrails = match self.guardrails {
            Some(engine) => engine,
            None => GuardrailEngine::new(&config.guardrails)?,
        };
        let token_counter = self.token_counter.unwrap_or_else(|| {
            Arc::new(CharacterEstimator::with_ratio(config.usage.chars_per_token))
        });

        let pipeline = StreamPipeline::new(
            router,
            Arc::new(guardrails),
            Arc::new(UsageTracker::new()),
        )
        .with_token_counter(token_counter)
        .with_prices(PriceTable::from_config(&config.usage))
        .with_timeout(config.request_timeout());

        let watcher = match (&config.models_path, config.watch_models) {
            (Some(path), true) => Some(ModelWatcher::spawn(Arc::clone(&registry), path.clone())?),
            _ => None,
        };

        tracing::info!(
            providers = ?pipeline.router().registered_models(),
            models = registry.len(),
            watching = watcher.is_some(),
            "gateway ready"
        );

        Ok(Gateway {
            config,
            pipeline,
            registry,
            _watcher: watcher,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
