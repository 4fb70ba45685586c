//! Gateway configuration.
//!
//! Loaded from YAML; every field has a default so an empty document is a valid
//! configuration. Environment variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `AIGW_ADDRESS` | `address` |
//! | `AIGW_MODELS_PATH` | `models_path` |
//! | `AIGW_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` (`0` disables) |

use crate::guardrails::GuardrailsConfig;
use crate::provider::DEFAULT_CHANNEL_CAPACITY;
use crate::usage::UsageConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ADDRESS: &str = "AIGW_ADDRESS";
pub const ENV_MODELS_PATH: &str = "AIGW_MODELS_PATH";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AIGW_REQUEST_TIMEOUT_SECS";

fn default_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address for the HTTP front end
    #[serde(default = "default_address")]
    pub address: String,
    /// Model source file; when unset the registry starts with the echo model
    #[serde(default)]
    pub models_path: Option<PathBuf>,
    /// Capacity of the bounded provider channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Upstream timeout per request
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Watch `models_path` and reload on change
    #[serde(default)]
    pub watch_models: bool,
    #[serde(default)]
    pub guardrails: GuardrailsConfig,
    #[serde(default)]
    pub usage: UsageConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            models_path: None,
            channel_capacity: default_channel_capacity(),
            request_timeout_secs: None,
            watch_models: false,
            guardrails: GuardrailsConfig::default(),
            usage: UsageConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source).map_err(|e| {
            Error::configuration_with_context(
                "invalid gateway configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("gateway_config"),
            )
        })
    }

    /// Read a YAML file, then apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration_with_context(
                "failed to read gateway configuration",
                ErrorContext::new()
                    .with_field_path(path.to_string_lossy())
                    .with_details(e.to_string())
                    .with_source("gateway_config"),
            )
        })?;
        let mut config = Self::from_yaml_str(&source)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup(ENV_ADDRESS).filter(|s| !s.trim().is_empty()) {
            self.address = address;
        }
        if let Some(path) = lookup(ENV_MODELS_PATH).filter(|s| !s.trim().is_empty()) {
            self.models_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => tracing::warn!(
                    var = ENV_REQUEST_TIMEOUT_SECS,
                    value = %raw,
                    "ignoring unparsable timeout override"
                ),
            }
        }
    }

    /// The upstream timeout, `None` when unset or zero.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
