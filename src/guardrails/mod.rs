//! Input guardrails: policy checks applied before any provider dispatch.
//!
//! # Guardrails Module
//!
//! The [`GuardrailEngine`] is a staged pipeline of [`ContentFilter`]s. Stages
//! run in order and the first violation short-circuits the check; the whole
//! request is rejected, there is no partial pass.
//!
//! Only the content of the **last** message is evaluated. Earlier turns were
//! checked when they were the active turn and are not re-checked.
//!
//! ## Stages
//!
//! | Stage | Description |
//! |-------|-------------|
//! | [`KeywordFilter`] | Case-insensitive substring match against banned terms |
//! | [`PatternFilter`] | Case-insensitive regex match |
//!
//! Further evaluators (semantic, dataset-based) plug in through
//! [`GuardrailEngine::with_stage`].
//!
//! ## Example
//!
//! ```rust
//! use ai_gateway::guardrails::{GuardrailEngine, GuardrailsConfig};
//!
//! let config = GuardrailsConfig::builder()
//!     .add_banned_term("password")
//!     .build();
//! let engine = GuardrailEngine::new(&config).unwrap();
//!
//! assert!(engine.check_input("my PASSWORD is 1234").is_err());
//! assert!(engine.check_input("hello").is_ok());
//! ```

mod config;
mod filters;
mod result;

pub use config::{GuardrailsConfig, GuardrailsConfigBuilder};
pub use filters::{ContentFilter, KeywordFilter, PatternFilter};
pub use result::{Violation, ViolationType};

use crate::types::ChatRequest;
use crate::{Error, Result};

/// Staged guardrail pipeline
pub struct GuardrailEngine {
    stages: Vec<Box<dyn ContentFilter>>,
}

impl GuardrailEngine {
    /// Build the engine from configuration.
    ///
    /// Fails only when a configured pattern does not compile.
    pub fn new(config: &GuardrailsConfig) -> Result<Self> {
        let mut engine = Self::permissive();
        if !config.enabled {
            return Ok(engine);
        }

        let keywords = KeywordFilter::from_terms(config.banned_terms.iter().cloned());
        if !keywords.is_empty() {
            engine = engine.with_stage(Box::new(keywords));
        }

        let patterns = PatternFilter::from_patterns(&config.patterns)?;
        if !patterns.is_empty() {
            engine = engine.with_stage(Box::new(patterns));
        }

        Ok(engine)
    }

    /// An engine with no stages; accepts everything.
    pub fn permissive() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the end of the chain.
    pub fn with_stage(mut self, stage: Box<dyn ContentFilter>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Names of the configured stages, in evaluation order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Check a piece of text against every stage.
    pub fn check_input(&self, text: &str) -> Result<()> {
        for stage in &self.stages {
            if let Some(violation) = stage.check(text) {
                tracing::warn!(
                    stage = stage.name(),
                    pattern = %violation.pattern,
                    "input rejected by guardrail"
                );
                return Err(Error::Guardrail {
                    violations: vec![violation],
                });
            }
        }
        Ok(())
    }

    /// Check the active turn of a request. Requests without messages pass.
    pub fn check_request(&self, req: &ChatRequest) -> Result<()> {
        match req.last_message() {
            Some(last) => self.check_input(&last.content),
            None => Ok(()),
        }
    }
}

impl Default for GuardrailEngine {
    /// The stock policy: a single keyword stage banning `"banned"`.
    fn default() -> Self {
        Self::permissive().with_stage(Box::new(KeywordFilter::from_terms(["banned"])))
    }
}

impl std::fmt::Debug for GuardrailEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardrailEngine")
            .field("stages", &self.stage_names())
            .finish()
    }
}
