//! Provider error taxonomy.
//!
//! Every failure crossing the executor boundary is one of these kinds, so the
//! routing layer can map it to a distinct external status.

use thiserror::Error;

/// Result alias used by providers and the executor.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Required setting (base URL, API key) missing. Never retried.
    #[error("provider configuration error: {0}")]
    Configuration(String),

    /// Upstream did not answer within the configured timeout.
    #[error("upstream request timed out: {0}")]
    Timeout(String),

    /// Transport failure or non-2xx status. `status` is the last observed code.
    #[error("upstream network error: {message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// 2xx response whose body is not a JSON object.
    #[error("upstream response error: {0}")]
    Response(String),

    /// Breaker is open; the upstream was not contacted.
    #[error("provider circuit breaker is open")]
    CircuitOpen,

    /// Anything else, wrapped at the executor boundary.
    #[error("unexpected provider failure: {0}")]
    Unexpected(String),
}

impl ProviderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(status: u16) -> Self {
        Self::Network {
            status: Some(status),
            message: format!("upstream HTTP {status}"),
        }
    }

    /// Timeouts are a network failure too.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network { .. })
    }

    /// Whether another attempt could change the outcome.
    pub fn is_retryable(&self) -> bool {
        self.is_network()
    }

    /// Stable machine-readable code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "provider_configuration",
            Self::Timeout(_) => "provider_timeout",
            Self::Network { .. } => "provider_network",
            Self::Response(_) => "provider_response",
            Self::CircuitOpen => "provider_circuit_open",
            Self::Unexpected(_) => "provider_unexpected",
        }
    }

    /// HTTP status the routing layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) => 503,
            Self::Timeout(_) => 504,
            Self::Network { .. } | Self::Response(_) => 502,
            Self::CircuitOpen => 503,
            Self::Unexpected(_) => 500,
        }
    }
}
