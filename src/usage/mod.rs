//! Usage accounting: token and cost counters shared by all in-flight requests.
//!
//! # Usage Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`UsageTracker`] | Process-wide, monotonically growing token and cost counters |
//! | [`UsageRecorder`] | Per-request helper that prices the prompt and produced messages and feeds the tracker |
//! | [`TokenCounter`] | Trait for token estimation |
//! | [`CharacterEstimator`] | Fast character-based approximation (4 chars ≈ 1 token) |
//! | [`PriceTable`] | Input and output unit price per model, each with a default |
//!
//! ## Example
//!
//! ```rust
//! use ai_gateway::usage::UsageTracker;
//!
//! let usage = UsageTracker::new();
//! usage.add_tokens(10, 0.01);
//! assert_eq!(usage.tokens(), 10);
//! assert_eq!(usage.cost(), 0.1);
//! ```

mod counter;
mod pricing;

pub use counter::{CharacterEstimator, TokenCounter};
pub use pricing::{PriceTable, UsageConfig};

use crate::types::Message;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

// Cost is accumulated in whole pico-units so that repeated additions do not
// drift. The fraction of a pico-unit left over by each addition is carried.
const COST_SCALE: f64 = 1e12;

/// Consistent snapshot of the usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageCounter {
    pub tokens: u64,
    pub cost: f64,
}

#[derive(Debug, Default)]
struct Totals {
    tokens: u64,
    cost_units: u128,
    // Always in [0, 1).
    remainder: f64,
}

/// Token and cost counters, safe to update from many requests at once.
///
/// Both counters are updated under one lock, so a reader never observes
/// tokens from an addition whose cost has not been applied yet.
#[derive(Debug, Default)]
pub struct UsageTracker {
    totals: Mutex<Totals>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` tokens priced at `unit_price` each.
    ///
    /// A negative or non-finite price is treated as zero so the counters
    /// never decrease. Cost below 1e-12 is not lost: the sub-unit part of
    /// every addition is kept and added to the next one, so `cost()` lags the
    /// exact sum by less than 1e-12.
    pub fn add_tokens(&self, count: u64, unit_price: f64) {
        let unit_price = if unit_price.is_finite() && unit_price >= 0.0 {
            unit_price
        } else {
            0.0
        };
        let units = count as f64 * unit_price * COST_SCALE;

        let mut totals = self.totals.lock().unwrap_or_else(PoisonError::into_inner);
        let carried = units + totals.remainder;
        let whole = carried.floor();
        totals.remainder = if whole.is_finite() { carried - whole } else { 0.0 };
        totals.tokens = totals.tokens.saturating_add(count);
        totals.cost_units = totals.cost_units.saturating_add(whole as u128);
    }

    /// Accumulated cost.
    pub fn cost(&self) -> f64 {
        self.snapshot().cost
    }

    /// Accumulated token count.
    pub fn tokens(&self) -> u64 {
        self.snapshot().tokens
    }

    pub fn snapshot(&self) -> UsageCounter {
        let totals = self.totals.lock().unwrap_or_else(PoisonError::into_inner);
        UsageCounter {
            tokens: totals.tokens,
            cost: totals.cost_units as f64 / COST_SCALE,
        }
    }
}

/// Records the usage of one request: its prompt once, then every produced message.
#[derive(Clone)]
pub struct UsageRecorder {
    tracker: Arc<UsageTracker>,
    counter: Arc<dyn TokenCounter>,
    unit_price: f64,
    input_unit_price: f64,
}

impl UsageRecorder {
    /// Recorder pricing produced messages at `unit_price` and the prompt for free.
    pub fn new(tracker: Arc<UsageTracker>, counter: Arc<dyn TokenCounter>, unit_price: f64) -> Self {
        Self {
            tracker,
            counter,
            unit_price,
            input_unit_price: 0.0,
        }
    }

    pub fn with_input_price(mut self, input_unit_price: f64) -> Self {
        self.input_unit_price = input_unit_price;
        self
    }

    /// Count, price and record the request's messages. Returns the tokens recorded.
    pub fn record_prompt(&self, messages: &[Message]) -> u64 {
        let tokens: u64 = messages
            .iter()
            .map(|m| self.counter.count_message(m) as u64)
            .sum();
        self.tracker.add_tokens(tokens, self.input_unit_price);
        tokens
    }

    /// Count, price and record one produced message. Returns the tokens recorded.
    pub fn record(&self, message: &Message) -> u64 {
        let tokens = self.counter.count_message(message) as u64;
        self.tracker.add_tokens(tokens, self.unit_price);
        tokens
    }
}

impl std::fmt::Debug for UsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageRecorder")
            .field("unit_price", &self.unit_price)
            .field("input_unit_price", &self.input_unit_price)
            .finish()
    }
}
