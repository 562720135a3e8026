use crate::models::Provider;
use thiserror::Error;

/// One provider's failure inside a fan-out query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: Provider,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    // ========================================================================
    // Transport
    // ========================================================================
    #[error("{provider} {operation} request failed: {message}")]
    Fetch {
        provider: Provider,
        operation: &'static str,
        message: String,
    },

    #[error("{provider} {operation} returned HTTP {status}")]
    Http {
        provider: Provider,
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} {operation} returned an unreadable payload: {message}")]
    Payload {
        provider: Provider,
        operation: &'static str,
        message: String,
    },

    // ========================================================================
    // Lookups
    // ========================================================================
    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: Provider,
        operation: &'static str,
    },

    #[error("Episode {episode_id} not found for {provider} title {media_id}")]
    EpisodeNotFound {
        provider: Provider,
        media_id: String,
        episode_id: String,
    },

    #[error("No playable stream for {provider} title {media_id} episode {episode_id}")]
    StreamUnavailable {
        provider: Provider,
        media_id: String,
        episode_id: String,
    },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    // ========================================================================
    // Aggregation
    // ========================================================================
    #[error("All providers failed for {operation} ({} failures)", .failures.len())]
    AllProvidersFailed {
        operation: &'static str,
        failures: Vec<ProviderFailure>,
    },
}

impl CatalogError {
    /// The provider this error is attributed to, if any.
    pub fn provider(&self) -> Option<Provider> {
        match self {
            CatalogError::Fetch { provider, .. }
            | CatalogError::Http { provider, .. }
            | CatalogError::Payload { provider, .. }
            | CatalogError::Unsupported { provider, .. }
            | CatalogError::EpisodeNotFound { provider, .. }
            | CatalogError::StreamUnavailable { provider, .. } => Some(*provider),
            CatalogError::UnknownProvider(_) | CatalogError::AllProvidersFailed { .. } => None,
        }
    }

    /// Check if the error may succeed when the same request is repeated.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Fetch { .. } => true,
            CatalogError::Http { status, .. } => *status >= 500 || *status == 429,
            CatalogError::AllProvidersFailed { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
