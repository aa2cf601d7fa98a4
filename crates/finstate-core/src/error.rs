//! Error types for data operations.
//!
//! This module defines [`DataError`] which covers all error cases that can occur
//! when fetching, parsing, or caching disclosure data.

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested company could not be resolved in the corporate directory.
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// Data is not available for the requested company and period.
    #[error("Data not available for {company} in {period}")]
    DataNotAvailable {
        /// The company that was requested.
        company: String,
        /// The requested period.
        period: String,
    },

    /// The provider answered with an application-level error status.
    #[error("{provider} returned status {status}: {message}")]
    Api {
        /// The provider that returned the status.
        provider: String,
        /// Provider status code.
        status: String,
        /// Provider message.
        message: String,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Authentication failed for a provider.
    #[error("Authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
