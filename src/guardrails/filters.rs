//! Content filtering stages

use super::result::{Violation, ViolationType};
use crate::{Error, ErrorContext, Result};

/// A single guardrail stage.
///
/// Stages are chained by [`super::GuardrailEngine`] and evaluated in order;
/// the first stage reporting a violation rejects the input.
pub trait ContentFilter: Send + Sync {
    /// Stage name, reported in violations
    fn name(&self) -> &str;

    /// Check content, returning the first violation found
    fn check(&self, content: &str) -> Option<Violation>;
}

/// Case-insensitive substring filter over a set of banned terms
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    terms: Vec<CompiledTerm>,
}

#[derive(Debug, Clone)]
struct CompiledTerm {
    term: String,
    term_lower: String,
}

impl KeywordFilter {
    /// Create a new empty keyword filter
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Create from a list of terms. Empty terms are ignored: they would match everything.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new();
        for term in terms {
            filter.add_term(term);
        }
        filter
    }

    /// Add a banned term
    pub fn add_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term.is_empty() {
            return;
        }
        self.terms.push(CompiledTerm {
            term_lower: term.to_lowercase(),
            term,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl ContentFilter for KeywordFilter {
    fn name(&self) -> &str {
        "keyword"
    }

    fn check(&self, content: &str) -> Option<Violation> {
        let content_lower = content.to_lowercase();
        self.terms
            .iter()
            .find(|t| content_lower.contains(&t.term_lower))
            .map(|t| {
                Violation::new(ViolationType::Keyword, self.name(), t.term.clone())
                    .with_matched_text(t.term.clone())
            })
    }
}

/// Regex pattern filter, case-insensitive
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    rules: Vec<regex::Regex>,
}

impl PatternFilter {
    /// Create a new empty pattern filter
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Compile all patterns up front; an invalid pattern is a configuration error.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for pattern in patterns {
            filter.add_pattern(pattern.as_ref())?;
        }
        Ok(filter)
    }

    /// Add a pattern rule
    pub fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        let re = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid guardrail pattern '{}'", pattern),
                    ErrorContext::new()
                        .with_field_path("guardrails.patterns")
                        .with_details(e.to_string()),
                )
            })?;
        self.rules.push(re);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ContentFilter for PatternFilter {
    fn name(&self) -> &str {
        "pattern"
    }

    fn check(&self, content: &str) -> Option<Violation> {
        self.rules.iter().find_map(|re| {
            re.find(content).map(|m| {
                Violation::new(ViolationType::Pattern, self.name(), re.as_str())
                    .with_matched_text(m.as_str())
            })
        })
    }
}
