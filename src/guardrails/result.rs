//! Violation types

use serde::{Deserialize, Serialize};

/// Type of violation detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Banned term substring match
    Keyword,
    /// Regex pattern match
    Pattern,
    /// Custom stage
    Custom,
}

/// A detected violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation
    pub violation_type: ViolationType,
    /// Name of the stage that rejected the input
    pub stage: String,
    /// The term or pattern that matched
    pub pattern: String,
    /// The matched text, when the stage can report it
    pub matched_text: Option<String>,
}

impl Violation {
    pub fn new(
        violation_type: ViolationType,
        stage: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            stage: stage.into(),
            pattern: pattern.into(),
            matched_text: None,
        }
    }

    pub fn with_matched_text(mut self, text: impl Into<String>) -> Self {
        self.matched_text = Some(text.into());
        self
    }

    /// Human-readable reason, used in logs.
    pub fn reason(&self) -> String {
        format!("{} stage matched '{}'", self.stage, self.pattern)
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}
