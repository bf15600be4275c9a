//! Provider error taxonomy.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors a text-generation backend can produce. All of them are folded
/// into a sentinel message at the gateway boundary; the deliberation
/// protocols never see this type.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("call exceeded time budget of {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed. Auth and parse failures
    /// are deterministic and are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidApiKey | Self::Malformed(_) | Self::Timeout(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimited("slow down".into()).is_retryable());
        assert!(
            ProviderError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::Api {
                status: 400,
                message: "bad request".into()
            }
            .is_retryable()
        );
        assert!(!ProviderError::InvalidApiKey.is_retryable());
        assert!(!ProviderError::Timeout(Duration::from_secs(5)).is_retryable());
    }
}
