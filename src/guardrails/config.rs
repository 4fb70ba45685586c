//! Guardrails configuration

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_banned_terms() -> Vec<String> {
    vec!["banned".to_string()]
}

/// Configuration for the guardrail engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    /// When false the engine has no stages and accepts everything
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Terms matched as case-insensitive substrings
    #[serde(default = "default_banned_terms")]
    pub banned_terms: Vec<String>,
    /// Regex patterns, matched case-insensitively after the term stage
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl GuardrailsConfig {
    /// Create a builder for GuardrailsConfig
    pub fn builder() -> GuardrailsConfigBuilder {
        GuardrailsConfigBuilder::default()
    }

    /// Create a permissive configuration (no filtering)
    pub fn permissive() -> Self {
        Self {
            enabled: false,
            banned_terms: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            banned_terms: default_banned_terms(),
            patterns: Vec::new(),
        }
    }
}

/// Builder for GuardrailsConfig. Starts from an enabled config with no terms.
#[derive(Debug, Clone)]
pub struct GuardrailsConfigBuilder {
    config: GuardrailsConfig,
}

impl Default for GuardrailsConfigBuilder {
    fn default() -> Self {
        Self {
            config: GuardrailsConfig {
                enabled: true,
                banned_terms: Vec::new(),
                patterns: Vec::new(),
            },
        }
    }
}

impl GuardrailsConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn add_banned_term(mut self, term: impl Into<String>) -> Self {
        self.config.banned_terms.push(term.into());
        self
    }

    pub fn add_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.patterns.push(pattern.into());
        self
    }

    pub fn build(self) -> GuardrailsConfig {
        self.config
    }
}
