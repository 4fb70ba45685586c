//! Hot-reloadable model registry.
//!
//! The registry holds the ordered list of known models. The list lives behind
//! an [`ArcSwap`]: a reload parses the whole source first and then replaces the
//! list in a single pointer swap, so readers see either the old list or the new
//! one, never a mix. A failed parse leaves the current list untouched.
//!
//! ## Source format
//!
//! YAML, either a bare sequence of entries or a mapping with a `models:`
//! sequence. Each entry is identified by its `model` field; `weight` is
//! optional and defaults to 1. Entries without a name are skipped and
//! unknown fields are ignored.
//!
//! ```yaml
//! - model: gpt-4o
//! - model: claude-3-5-sonnet
//!   weight: 3
//! - {}                 # skipped
//! ```

pub mod watch;

pub use watch::ModelWatcher;

use crate::{Error, ErrorContext, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Weight assigned to entries that do not specify one.
pub const DEFAULT_WEIGHT: u32 = 1;

/// A named routing target with an associated weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub weight: u32,
}

impl Model {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelSource {
    List(Vec<Option<ModelEntry>>),
    Document {
        #[serde(default)]
        models: Vec<Option<ModelEntry>>,
    },
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    weight: Option<u32>,
}

/// Parse a model source into the list it describes.
pub fn parse_models(source: &str) -> Result<Vec<Model>> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: ModelSource = serde_yaml::from_str(source).map_err(|e| {
        Error::registry_with_context(
            "failed to parse model source",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("model_registry"),
        )
    })?;

    let entries = match parsed {
        ModelSource::List(entries) => entries,
        ModelSource::Document { models } => models,
    };

    let mut models = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let Some(entry) = entry else {
            tracing::debug!(index = idx, "skipping empty model entry");
            continue;
        };
        match entry.model {
            Some(name) if !name.trim().is_empty() => {
                models.push(Model::new(name, entry.weight.unwrap_or(DEFAULT_WEIGHT)));
            }
            _ => tracing::debug!(index = idx, "skipping model entry without a name"),
        }
    }
    Ok(models)
}

/// Ordered list of models, replaced as a unit on reload
pub struct ModelRegistry {
    models: ArcSwap<Vec<Model>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn with_models(models: Vec<Model>) -> Self {
        Self {
            models: ArcSwap::from_pointee(models),
        }
    }

    /// Replace the list with the models described by `source`.
    ///
    /// Returns the number of models loaded. On error the previous list is kept.
    pub fn load(&self, source: &str) -> Result<usize> {
        let models = parse_models(source)?;
        let count = models.len();
        self.store(models);
        tracing::info!(models = count, "model registry reloaded");
        Ok(count)
    }

    /// Replace the list with `models` in one swap.
    pub fn store(&self, models: Vec<Model>) {
        self.models.store(Arc::new(models));
    }

    /// Read `path` and [`load`](Self::load) its contents.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::registry_with_context(
                "failed to read model source",
                ErrorContext::new()
                    .with_field_path(path.to_string_lossy())
                    .with_details(e.to_string())
                    .with_source("model_registry"),
            )
        })?;
        self.load(&source)
    }

    /// Snapshot of the current list.
    pub fn list(&self) -> Vec<Model> {
        self.models.load().as_ref().clone()
    }

    /// Shared snapshot of the current list, without copying it.
    pub fn snapshot(&self) -> Arc<Vec<Model>> {
        self.models.load_full()
    }

    pub fn len(&self) -> usize {
        self.models.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.models.load())
            .finish()
    }
}
