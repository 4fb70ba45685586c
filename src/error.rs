use crate::error_code::GatewayErrorCode;
use crate::guardrails::Violation;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Message returned to callers for any malformed request.
pub const INVALID_REQUEST_MESSAGE: &str = "invalid request";

/// Message returned to callers when a guardrail blocks the input.
pub const GUARDRAIL_VIOLATION_MESSAGE: &str = "input violates guardrails";

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "request.model", "models[2].weight")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "model_registry", "request_validator")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the gateway core.
///
/// Variants follow the failure taxonomy of the dispatch pipeline: validation
/// and guardrail errors never reach a provider, provider errors are reported
/// before any frame is written, and registry errors leave the model list as
/// it was.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("input violates guardrails: {}", format_violations(.violations))]
    Guardrail { violations: Vec<Violation> },

    #[error("Provider error: {message}{}", format_context(.context))]
    Provider {
        message: String,
        context: ErrorContext,
    },

    #[error("No provider registered (requested model '{model}')")]
    NoProvider { model: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Upstream timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Model registry load error: {message}{}", format_context(.context))]
    RegistryLoad {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.reason())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new provider error with structured context
    pub fn provider_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Provider {
            message: msg.into(),
            context,
        }
    }

    /// Create a new registry load error with structured context
    pub fn registry_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::RegistryLoad {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. }
            | Error::Provider { context, .. }
            | Error::RegistryLoad { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Stable error kind for this error.
    pub fn code(&self) -> GatewayErrorCode {
        match self {
            Error::Validation { .. } => GatewayErrorCode::InvalidRequest,
            Error::Guardrail { .. } => GatewayErrorCode::GuardrailViolation,
            Error::Provider { .. } => GatewayErrorCode::ProviderError,
            Error::NoProvider { .. } => GatewayErrorCode::NoProvider,
            Error::Cancelled => GatewayErrorCode::Cancelled,
            Error::Timeout { .. } => GatewayErrorCode::UpstreamTimeout,
            Error::RegistryLoad { .. } => GatewayErrorCode::RegistryLoad,
            Error::Configuration { .. } => GatewayErrorCode::Configuration,
            Error::Serialization(_) => GatewayErrorCode::Internal,
        }
    }

    /// HTTP status for this error.
    pub fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    /// The message exposed to callers in the `error` field of the response body.
    ///
    /// Validation and guardrail failures use fixed messages so that request
    /// content is never echoed back; provider failures carry their message.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation { .. } => INVALID_REQUEST_MESSAGE.to_string(),
            Error::Guardrail { .. } => GUARDRAIL_VIOLATION_MESSAGE.to_string(),
            Error::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// JSON body for the error response, `{"error": <message>}`.
    pub fn to_body(&self) -> serde_json::Value {
        json!({ "error": self.public_message() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body_is_fixed() {
        let err = Error::validation_with_context(
            "missing field `model`",
            ErrorContext::new().with_field_path("request.model"),
        );
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.to_body(), json!({"error": "invalid request"}));
        assert!(err.to_string().contains("field: request.model"));
    }

    #[test]
    fn test_provider_body_carries_message() {
        let err = Error::provider_with_context("upstream refused", ErrorContext::new());
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.to_body(), json!({"error": "upstream refused"}));
    }

    #[test]
    fn test_guardrail_body() {
        let err = Error::Guardrail { violations: Vec::new() };
        assert_eq!(err.code(), GatewayErrorCode::GuardrailViolation);
        assert_eq!(err.to_body(), json!({"error": "input violates guardrails"}));
    }

    #[test]
    fn test_timeout_is_distinct_from_cancellation() {
        let timeout = Error::Timeout {
            after: Duration::from_secs(2),
        };
        assert_eq!(timeout.http_status(), 504);
        assert_eq!(timeout.to_body(), json!({"error": "Upstream timed out after 2s"}));
        assert_eq!(Error::Cancelled.http_status(), 499);
        assert_ne!(timeout.code(), Error::Cancelled.code());
    }
}
