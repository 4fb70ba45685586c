//! Token counter implementations.

use crate::types::Message;

/// Estimates the number of tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Tokens attributed to one produced message (its content only).
    fn count_message(&self, message: &Message) -> usize {
        self.count(&message.content)
    }
}

/// Character-based approximation: `ceil(len / chars_per_token)`.
#[derive(Debug, Clone)]
pub struct CharacterEstimator {
    chars_per_token: f64,
}

impl CharacterEstimator {
    pub fn new() -> Self {
        Self::with_ratio(4.0)
    }

    /// Non-positive or non-finite ratios fall back to 4.0.
    pub fn with_ratio(r: f64) -> Self {
        let chars_per_token = if r.is_finite() && r > 0.0 { r } else { 4.0 };
        Self { chars_per_token }
    }

    pub fn ratio(&self) -> f64 {
        self.chars_per_token
    }
}

impl Default for CharacterEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharacterEstimator {
    fn count(&self, text: &str) -> usize {
        (text.len() as f64 / self.chars_per_token).ceil() as usize
    }
}
