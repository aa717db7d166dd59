//! Rate limit aware execution of GitHub calls.
//!
//! `RateLimitedFetcher` wraps a single API call. When GitHub reports that the
//! rate limit is exhausted it sleeps until the limit resets and tries the
//! same call again, for as long as it takes. Every other failure is returned
//! to the caller untouched.

use crate::config::AppConfig;
use crate::error::ReportError;
use chrono::{DateTime, Duration, Local, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Source of the current time, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Decides whether an error is worth waiting out, and for how long.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Added to the reset time to absorb clock skew.
    pub buffer: Duration,
    /// No backoff is ever shorter than this.
    pub minimum_wait: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            buffer: Duration::seconds(2),
            minimum_wait: Duration::seconds(5),
        }
    }
}

impl BackoffPolicy {
    /// Expects a validated config, whose backoff settings are at most an hour.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            buffer: seconds(config.rate_limit_buffer_seconds),
            minimum_wait: seconds(config.rate_limit_min_wait_seconds),
        }
    }

    /// Returns the wait before retrying, or `None` when `error` is fatal.
    pub fn wait_for(&self, error: &ReportError, now: DateTime<Utc>) -> Option<StdDuration> {
        let ReportError::RateLimited { reset_at, .. } = error else {
            return None;
        };

        let wait = match reset_at {
            Some(reset_at) => (*reset_at - now + self.buffer).max(self.minimum_wait),
            None => self.minimum_wait,
        };
        // Both operands of `max` are non-negative once minimum_wait is.
        Some(wait.to_std().unwrap_or(StdDuration::ZERO))
    }
}

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[derive(Clone)]
pub struct RateLimitedFetcher {
    policy: BackoffPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimitedFetcher {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: BackoffPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// Runs `operation` until it succeeds or fails with a non rate limit error.
    ///
    /// `label` names the call in the notice logged before each backoff.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ReportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ReportError>>,
    {
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let now = self.clock.now();
            let Some(wait) = self.policy.wait_for(&error, now) else {
                return Err(error);
            };

            let resume_at = now + Duration::from_std(wait).unwrap_or_else(|_| Duration::zero());
            tracing::warn!(
                operation = label,
                wait_secs = wait.as_secs(),
                "Rate limit hit during {}; waiting {}s, resuming at {}",
                label,
                wait.as_secs(),
                resume_at.with_timezone(&Local).format("%H:%M:%S")
            );
            tokio::time::sleep(wait).await;
        }
    }
}
