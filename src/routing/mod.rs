//! Model routing: resolve a model identifier to a provider.
//!
//! The [`Router`] owns the provider table (identifier → provider) and the
//! default provider. The default is the first provider ever registered and is
//! never reassigned; re-registering an identifier only replaces the routing
//! entry for that identifier.
//!
//! [`Router::select`] picks one [`Model`] from the registry through a
//! [`SelectionStrategy`]. Only [`FirstModel`] ships; weighted or
//! latency-based strategies implement the same trait.
//!
//! Concurrency: the provider table sits behind a read/write lock so that
//! registration after traffic has started is safe. The model list is read
//! from a registry snapshot, so the router never holds its own lock while
//! touching the registry.

use crate::provider::Provider;
use crate::registry::{Model, ModelRegistry};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Strategy for picking a model out of the registry's current list.
///
/// Implementations must return exactly one model for a non-empty list.
pub trait SelectionStrategy: Send + Sync {
    fn select(&self, models: &[Model]) -> Option<Model>;
}

/// Always picks the first model in registry order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstModel;

impl SelectionStrategy for FirstModel {
    fn select(&self, models: &[Model]) -> Option<Model> {
        models.first().cloned()
    }
}

#[derive(Default)]
struct ProviderTable {
    providers: HashMap<String, Arc<dyn Provider>>,
    default: Option<Arc<dyn Provider>>,
}

/// Maps model identifiers to providers, with a sticky default.
pub struct Router {
    table: RwLock<ProviderTable>,
    models: Arc<ModelRegistry>,
    strategy: Box<dyn SelectionStrategy>,
}

impl Router {
    pub fn new(models: Arc<ModelRegistry>) -> Self {
        Self {
            table: RwLock::new(ProviderTable::default()),
            models,
            strategy: Box::new(FirstModel),
        }
    }

    /// Replace the selection strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn SelectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Associate `model_id` with `provider`.
    ///
    /// The first provider ever registered becomes the default.
    pub fn register(&self, model_id: impl Into<String>, provider: Arc<dyn Provider>) {
        let model_id = model_id.into();
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.default.is_none() {
            tracing::debug!(model = %model_id, provider = provider.name(), "default provider set");
            table.default = Some(Arc::clone(&provider));
        }
        if table.providers.insert(model_id.clone(), provider).is_some() {
            tracing::debug!(model = %model_id, "provider re-registered");
        }
    }

    /// The provider registered under `model_id`, else the default provider.
    ///
    /// Fails only when nothing has been registered yet.
    pub fn provider_for(&self, model_id: &str) -> Result<Arc<dyn Provider>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = table.providers.get(model_id) {
            return Ok(Arc::clone(p));
        }
        table.default.clone().ok_or_else(|| Error::NoProvider {
            model: model_id.to_string(),
        })
    }

    /// Whether `model_id` has its own routing entry.
    pub fn is_registered(&self, model_id: &str) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .providers
            .contains_key(model_id)
    }

    /// Registered identifiers, sorted.
    pub fn registered_models(&self) -> Vec<String> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = table.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Pick a model with the active strategy; a zero-value model when the list is empty.
    pub fn select(&self) -> Model {
        let snapshot = self.models.snapshot();
        self.strategy.select(&snapshot).unwrap_or_default()
    }

    /// The registry this router selects from.
    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("registered", &self.registered_models())
            .field("models", &self.models)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MessageStream;
    use crate::types::ChatRequest;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Named(&'static str);

    #[async_trait]
    impl Provider for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn chat(&self, _ctx: CancellationToken, _req: &ChatRequest) -> Result<MessageStream> {
            Ok(MessageStream::empty())
        }
    }

    fn router() -> Router {
        Router::new(Arc::new(ModelRegistry::new()))
    }

    #[test]
    fn test_default_is_first_registered() {
        let r = router();
        r.register("a", Arc::new(Named("p1")));
        r.register("b", Arc::new(Named("p2")));

        assert_eq!(r.provider_for("unknown").unwrap().name(), "p1");
        assert_eq!(r.provider_for("b").unwrap().name(), "p2");
    }

    #[test]
    fn test_reregister_keeps_default() {
        let r = router();
        r.register("a", Arc::new(Named("p1")));
        r.register("a", Arc::new(Named("p3")));

        assert_eq!(r.provider_for("a").unwrap().name(), "p3");
        assert_eq!(r.provider_for("missing").unwrap().name(), "p1");
    }

    #[test]
    fn test_empty_router_has_no_provider() {
        let err = router().provider_for("echo").err().unwrap();
        assert!(matches!(err, Error::NoProvider { .. }));
    }

    #[test]
    fn test_select_first_or_zero_value() {
        let models = Arc::new(ModelRegistry::new());
        let r = Router::new(Arc::clone(&models));
        assert_eq!(r.select(), Model::default());

        models.load("- model: x\n- model: y\n").unwrap();
        assert_eq!(r.select(), Model::new("x", 1));
    }

    struct Heaviest;

    impl SelectionStrategy for Heaviest {
        fn select(&self, models: &[Model]) -> Option<Model> {
            models.iter().max_by_key(|m| m.weight).cloned()
        }
    }

    #[test]
    fn test_custom_strategy() {
        let models = Arc::new(ModelRegistry::with_models(vec![
            Model::new("light", 1),
            Model::new("heavy", 5),
        ]));
        let r = Router::new(models).with_strategy(Box::new(Heaviest));
        assert_eq!(r.select().name, "heavy");
    }
}
