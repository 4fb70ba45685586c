//! Stable error codes surfaced by the gateway.
//!
//! Every failure in the dispatch core maps onto one of these codes so that
//! callers (the HTTP layer, logs, dashboards) see a stable kind and status
//! regardless of which component produced the error.
//!
//! ## Error Code Categories
//!
//! | Prefix | Category    | Description                          |
//! |--------|-------------|--------------------------------------|
//! | G1xxx  | client      | Request-side errors                  |
//! | G2xxx  | policy      | Content rejected by guardrails       |
//! | G3xxx  | upstream    | Provider dispatch failures           |
//! | G4xxx  | operational | Registry, configuration, internal    |
//!
//! ## Example
//!
//! ```rust
//! use ai_gateway::error_code::GatewayErrorCode;
//!
//! let code = GatewayErrorCode::GuardrailViolation;
//! assert_eq!(code.code(), "G2001");
//! assert_eq!(code.http_status(), 400);
//! assert_eq!(code.category(), "policy");
//! ```

use std::fmt;

/// Stable, machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorCode {
    /// G1001: Malformed request body or missing required fields
    InvalidRequest,
    /// G2001: Input rejected by a guardrail stage
    GuardrailViolation,
    /// G3001: Provider failed before a stream was created
    ProviderError,
    /// G3002: No provider is registered at all
    NoProvider,
    /// G3003: Request was cancelled by the caller before completion
    Cancelled,
    /// G3004: Provider did not finish within the upstream timeout
    UpstreamTimeout,
    /// G4001: Model source could not be parsed or read
    RegistryLoad,
    /// G4002: Invalid gateway configuration
    Configuration,
    /// G4999: Anything else (frame serialization)
    Internal,
}

impl GatewayErrorCode {
    /// Returns the canonical code string (e.g., `"G1001"`).
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "G1001",
            Self::GuardrailViolation => "G2001",
            Self::ProviderError => "G3001",
            Self::NoProvider => "G3002",
            Self::Cancelled => "G3003",
            Self::UpstreamTimeout => "G3004",
            Self::RegistryLoad => "G4001",
            Self::Configuration => "G4002",
            Self::Internal => "G4999",
        }
    }

    /// Returns the standard name (e.g., `"invalid_request"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::GuardrailViolation => "guardrail_violation",
            Self::ProviderError => "provider_error",
            Self::NoProvider => "no_provider",
            Self::Cancelled => "cancelled",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::RegistryLoad => "registry_load",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }

    /// HTTP status the transport layer should answer with.
    #[inline]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest | Self::GuardrailViolation => 400,
            Self::Cancelled => 499,
            Self::UpstreamTimeout => 504,
            Self::ProviderError
            | Self::NoProvider
            | Self::RegistryLoad
            | Self::Configuration
            | Self::Internal => 500,
        }
    }

    /// Returns the category: `"client"`, `"policy"`, `"upstream"` or `"operational"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "client",
            Self::GuardrailViolation => "policy",
            Self::ProviderError | Self::NoProvider | Self::Cancelled | Self::UpstreamTimeout => {
                "upstream"
            }
            Self::RegistryLoad | Self::Configuration | Self::Internal => "operational",
        }
    }

    /// Whether the failure is attributable to the caller's request.
    #[inline]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
