//! Error types for the playability engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine facade. Callers need to tell "no data"
/// apart from "stale cached data", so query operations propagate these
/// rather than falling back silently; `get_alerts` is the one exception
/// and degrades to an empty list.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("weather fetch failed: {0}")]
    FetchFailed(String),

    #[error("forecast unavailable: {0}")]
    ForecastFailed(String),

    #[error("no weather data available for this location")]
    LocationUnavailable,

    #[error("provider rate limit exceeded")]
    RateLimitExceeded,
}

impl EngineError {
    pub fn fetch(detail: impl std::fmt::Display) -> Self {
        EngineError::FetchFailed(detail.to_string())
    }

    pub fn forecast(detail: impl std::fmt::Display) -> Self {
        EngineError::ForecastFailed(detail.to_string())
    }
}
