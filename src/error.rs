//! Error taxonomy for the review coverage report.
//!
//! Every failure that crosses a module boundary is a [`ReportError`]. The
//! variants mirror how the run reacts: configuration and authorization
//! problems are fatal, rate limits are retried by
//! [`RateLimitedFetcher`](crate::retry::RateLimitedFetcher), and everything
//! else aborts the run.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    /// Required settings were missing or invalid.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// GitHub rejected the token or its scopes.
    #[error("GitHub rejected the token: {message}")]
    Authorization { message: String },

    /// The API rate limit was exhausted.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimited {
        /// When the limit resets, if GitHub told us.
        reset_at: Option<DateTime<Utc>>,
        message: String,
    },

    /// GitHub answered with an error or a payload we could not read.
    #[error("GitHub API error: {message}")]
    Api { message: String },

    /// The request never got a response.
    #[error("network error talking to GitHub: {message}")]
    Network { message: String },
}

impl ReportError {
    /// Process exit code for this category of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::Configuration { .. } => 1,
            ReportError::Authorization { .. } => 2,
            ReportError::RateLimited { .. } => 3,
            ReportError::Api { .. } | ReportError::Network { .. } => 4,
        }
    }
}

/// Maps any error chain to an exit code; unknown errors are unexpected (4).
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ReportError>())
        .map_or(4, ReportError::exit_code)
}
