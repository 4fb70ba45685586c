//! File watcher that reloads the model registry when its source changes.

use super::ModelRegistry;
use crate::{Error, ErrorContext, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Keeps a [`ModelRegistry`] in sync with a file on disk.
///
/// The parent directory is watched rather than the file itself so that
/// editors that replace the file on save are still picked up. Reloads that
/// fail are logged and the registry keeps its previous list. Dropping the
/// watcher stops it.
pub struct ModelWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    path: PathBuf,
}

impl ModelWatcher {
    /// Start watching `path`. Must be called from within a tokio runtime.
    pub fn spawn(registry: Arc<ModelRegistry>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file_name = path.file_name().map(|n| n.to_os_string()).ok_or_else(|| {
            Error::configuration_with_context(
                "model source path has no file name",
                ErrorContext::new()
                    .with_field_path(path.to_string_lossy())
                    .with_source("model_watcher"),
            )
        })?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let touches_source = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if touches_source && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "model file watch error"),
            },
        )
        .map_err(|e| watch_error(&path, e))?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(&path, e))?;

        let reload_path = path.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Coalesce bursts of events into one reload.
                while rx.try_recv().is_ok() {}
                match registry.load_file(&reload_path).await {
                    Ok(count) => tracing::info!(
                        path = %reload_path.display(),
                        models = count,
                        "reloaded models after file change"
                    ),
                    Err(e) => tracing::warn!(
                        path = %reload_path.display(),
                        error = %e,
                        "model reload failed, keeping previous list"
                    ),
                }
            }
        });

        tracing::debug!(path = %path.display(), "watching model source");
        Ok(Self {
            _watcher: watcher,
            task,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ModelWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn watch_error(path: &Path, e: notify::Error) -> Error {
    Error::registry_with_context(
        "failed to watch model source",
        ErrorContext::new()
            .with_field_path(path.to_string_lossy())
            .with_details(e.to_string())
            .with_source("model_watcher"),
    )
}
