//! Application configuration and environment variable parsing.
//!
//! This module loads settings from the environment (optionally seeded from a
//! .env file). It defines the `AppConfig` struct, which names the organization
//! to report on, the token to authenticate with, and the knobs that govern
//! pacing against GitHub's rate limits.

use crate::error::ReportError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration as StdDuration;

/// Longest accepted report window, ten years.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Longest accepted rate limit buffer or minimum wait, one hour. GitHub's
/// primary limits reset hourly.
pub const MAX_BACKOFF_SECONDS: u64 = 3600;

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// GitHub personal access token. Never logged; see [`AppConfig::masked_token`].
    pub github_token: String,

    /// The organization whose repositories are reported on.
    pub github_org: String,

    /// Optional API base URL, for GitHub Enterprise installations.
    #[serde(default)]
    pub github_api_url: Option<String>,

    /// Length of the trailing report window in days.
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Pause between two repositories, in seconds.
    #[serde(default = "default_inter_repo_delay_seconds")]
    pub inter_repo_delay_seconds: u64,

    /// Seconds added to a rate limit's reset time before retrying.
    #[serde(default = "default_rate_limit_buffer_seconds")]
    pub rate_limit_buffer_seconds: u64,

    /// Lower bound for any rate limit backoff, in seconds.
    #[serde(default = "default_rate_limit_min_wait_seconds")]
    pub rate_limit_min_wait_seconds: u64,

    /// Hard limit on search result pages per repository.
    /// GitHub search stops at 1000 results, i.e. 10 pages of 100.
    #[serde(default = "default_max_search_pages")]
    pub max_search_pages: u32,

    /// Where the CSV report is written.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Emit logs as JSON instead of human-readable lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_window_days() -> i64 {
    7
}

fn default_inter_repo_delay_seconds() -> u64 {
    5
}

fn default_rate_limit_buffer_seconds() -> u64 {
    2
}

fn default_rate_limit_min_wait_seconds() -> u64 {
    5
}

fn default_max_search_pages() -> u32 {
    10
}

fn default_output_path() -> String {
    "by_repo_7d.csv".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ReportError> {
        let config: Self = envy::from_env().map_err(|e| ReportError::Configuration {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ReportError> {
        if self.github_token.trim().is_empty() {
            return Err(ReportError::Configuration {
                message: "GITHUB_TOKEN is empty".to_string(),
            });
        }
        if self.github_org.trim().is_empty() {
            return Err(ReportError::Configuration {
                message: "GITHUB_ORG is empty".to_string(),
            });
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(ReportError::Configuration {
                message: format!(
                    "WINDOW_DAYS must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                    self.window_days
                ),
            });
        }
        if self.max_search_pages == 0 {
            return Err(ReportError::Configuration {
                message: "MAX_SEARCH_PAGES must be at least 1".to_string(),
            });
        }
        if !(1..=MAX_BACKOFF_SECONDS).contains(&self.rate_limit_min_wait_seconds) {
            return Err(ReportError::Configuration {
                message: format!(
                    "RATE_LIMIT_MIN_WAIT_SECONDS must be between 1 and {MAX_BACKOFF_SECONDS}, got {}",
                    self.rate_limit_min_wait_seconds
                ),
            });
        }
        if self.rate_limit_buffer_seconds > MAX_BACKOFF_SECONDS {
            return Err(ReportError::Configuration {
                message: format!(
                    "RATE_LIMIT_BUFFER_SECONDS must be at most {MAX_BACKOFF_SECONDS}, got {}",
                    self.rate_limit_buffer_seconds
                ),
            });
        }
        Ok(())
    }

    pub fn inter_repo_delay(&self) -> StdDuration {
        StdDuration::from_secs(self.inter_repo_delay_seconds)
    }

    /// The token with everything but its last four characters starred out.
    pub fn masked_token(&self) -> String {
        mask_token(&self.github_token)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("github_token", &self.masked_token())
            .field("github_org", &self.github_org)
            .field("github_api_url", &self.github_api_url)
            .field("window_days", &self.window_days)
            .field("inter_repo_delay_seconds", &self.inter_repo_delay_seconds)
            .field("rate_limit_buffer_seconds", &self.rate_limit_buffer_seconds)
            .field("rate_limit_min_wait_seconds", &self.rate_limit_min_wait_seconds)
            .field("max_search_pages", &self.max_search_pages)
            .field("output_path", &self.output_path)
            .field("log_json", &self.log_json)
            .finish()
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
