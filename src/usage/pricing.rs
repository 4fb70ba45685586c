//! Per-model unit pricing for prompt (input) and produced (output) tokens.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_chars_per_token() -> f64 {
    4.0
}

/// Usage accounting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Price per token for models without an explicit entry
    #[serde(default)]
    pub default_unit_price: f64,
    /// Price per token, keyed by model identifier
    #[serde(default)]
    pub prices: HashMap<String, f64>,
    /// Price per prompt token for models without an explicit entry
    #[serde(default)]
    pub default_input_unit_price: f64,
    /// Price per prompt token, keyed by model identifier
    #[serde(default)]
    pub input_prices: HashMap<String, f64>,
    /// Ratio used by the character-based token estimator
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            default_unit_price: 0.0,
            prices: HashMap::new(),
            default_input_unit_price: 0.0,
            input_prices: HashMap::new(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

/// Resolves the output and input unit prices for a model.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    default_unit_price: f64,
    prices: HashMap<String, f64>,
    default_input_unit_price: f64,
    input_prices: HashMap<String, f64>,
}

impl PriceTable {
    /// Table with an output default of `default_unit_price`; prompts are free.
    pub fn new(default_unit_price: f64) -> Self {
        Self {
            default_unit_price: sanitize(default_unit_price),
            ..Self::default()
        }
    }

    pub fn from_config(config: &UsageConfig) -> Self {
        let mut table = Self::new(config.default_unit_price)
            .with_default_input_price(config.default_input_unit_price);
        for (model, price) in &config.prices {
            table = table.with_price(model.clone(), *price);
        }
        for (model, price) in &config.input_prices {
            table = table.with_input_price(model.clone(), *price);
        }
        table
    }

    pub fn with_price(mut self, model: impl Into<String>, unit_price: f64) -> Self {
        self.prices.insert(model.into(), sanitize(unit_price));
        self
    }

    pub fn with_default_input_price(mut self, unit_price: f64) -> Self {
        self.default_input_unit_price = sanitize(unit_price);
        self
    }

    pub fn with_input_price(mut self, model: impl Into<String>, unit_price: f64) -> Self {
        self.input_prices.insert(model.into(), sanitize(unit_price));
        self
    }

    /// Prompt token price for `model`, falling back to the default input price.
    pub fn input_unit_price(&self, model: &str) -> f64 {
        self.input_prices
            .get(model)
            .copied()
            .unwrap_or(self.default_input_unit_price)
    }

    /// Unit price for `model`, falling back to the default price.
    pub fn unit_price(&self, model: &str) -> f64 {
        self.prices
            .get(model)
            .copied()
            .unwrap_or(self.default_unit_price)
    }
}

// Prices must be finite and non-negative; anything else counts as free.
fn sanitize(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        tracing::warn!(price, "ignoring invalid unit price");
        0.0
    }
}
