use std::time::Duration;

use thiserror::Error;

use crate::provider::ProviderId;

/// Aggregates every failure mode a provider attempt can settle with.
///
/// Errors are values end to end: adapters return them, the timeout wrapper and
/// retry supervisor pass them through unchanged, and the orchestrator folds the
/// final one into a `ProviderOutcome`. Nothing in the dispatch path panics or
/// rethrows, so one provider's failure can never disturb another's slot.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider was requested but its API key is not configured.
    ///
    /// Raised before any network activity; never retried.
    #[error("missing credential for {provider}: set {env_hint}")]
    MissingCredential {
        provider: ProviderId,
        /// Environment variable(s) the operator should set.
        env_hint: &'static str,
    },
    /// A single attempt exceeded its per-attempt deadline.
    #[error("{label} timed out after {after:?}")]
    Timeout { label: String, after: Duration },
    /// The vendor returned a structured error payload.
    #[error("{provider} rejected request: {message}")]
    Rejected {
        provider: &'static str,
        /// Human-readable message extracted from the vendor error body.
        message: String,
    },
    /// The vendor answered 2xx but the body did not have the expected shape.
    #[error("{provider} returned malformed response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
    /// Network-level fault below the vendor protocol.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ProviderError {
    /// Creates a [`ProviderError::Transport`] from a textual description.
    ///
    /// Keeps call sites concise and transport failures uniformly formatted
    /// across adapters.
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a [`ProviderError::Rejected`] with the given provider name.
    pub fn rejected<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Rejected {
            provider,
            message: message.into(),
        }
    }

    /// Creates a [`ProviderError::Malformed`] with the given provider name.
    pub fn malformed<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Malformed {
            provider,
            message: message.into(),
        }
    }

    /// True when retrying can never help, regardless of the attempt ceiling.
    ///
    /// Only configuration problems qualify. Timeouts, rejections, and
    /// malformed bodies are all retried uniformly; vendors do not tag auth
    /// failures reliably inside a `Rejected` payload, so those retry too.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}
