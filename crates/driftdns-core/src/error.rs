//! Error types for the driftdns system
//!
//! Every component of a reconciliation pass (IP resolver, record lookup,
//! record updater) returns these errors unchanged; only the scheduler's pass
//! boundary catches them.

use std::fmt;
use thiserror::Error;

/// Result type alias for driftdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a DNS provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credentials rejected or insufficient permissions
    Authentication,
    /// Provider throttled the request
    RateLimited,
    /// Hosted zone (or other addressed resource) does not exist
    NotFound,
    /// Provider rejected the request shape (e.g. an invalid change batch)
    InvalidRequest,
    /// Provider-side server error
    Transient,
    /// The request never produced a response
    Network,
    /// Anything else
    Other,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Authentication => "authentication failed",
            Self::RateLimited => "rate limited",
            Self::NotFound => "not found",
            Self::InvalidRequest => "invalid request",
            Self::Transient => "server error",
            Self::Network => "network failure",
            Self::Other => "error",
        };
        f.write_str(label)
    }
}

/// Core error type for the driftdns system
#[derive(Error, Debug)]
pub enum Error {
    /// The public IP could not be resolved
    #[error("Network error: {0}")]
    Network(String),

    /// DNS provider API failure
    #[error("Provider error ({provider}, {kind}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Failure classification
        kind: ProviderErrorKind,
        /// Error message
        message: String,
    },

    /// More than one record in the zone matched the configured name and type
    #[error("Ambiguous record: {matches} A records named {name} in zone {zone_id}")]
    AmbiguousRecord {
        /// Hosted zone that was searched
        zone_id: String,
        /// Domain name that was searched for
        name: String,
        /// Number of matching records
        matches: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading the configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a provider error
    pub fn provider(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Provider failure classification, if this is a provider error
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
