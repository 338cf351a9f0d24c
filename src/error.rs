// Error types for the surge data layer.
// Classifies transport, HTTP, and decode failures into the values the query
// cache stores and hands to every subscriber.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the dispatcher and stored in query cache entries.
///
/// Variants carry display-ready detail instead of source errors so the enum
/// stays `Clone + PartialEq`; a cache entry keeps the error value and watch
/// channels hand copies to every subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurgeError {
    /// The transport could not complete the request.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}")]
    Http { status: StatusCode },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// API quota exhausted (403 with no remaining requests).
    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for SurgeError {
    fn from(err: reqwest::Error) -> Self {
        SurgeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SurgeError {
    fn from(err: serde_json::Error) -> Self {
        SurgeError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SurgeError>;
