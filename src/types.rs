//! Domain records fetched from GitHub.
//!
//! These are snapshots of GitHub's state at fetch time and are never mutated
//! after construction.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// A repository as returned by the organization listing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// Archived repositories and forks are left out of the report.
    pub fn is_eligible(&self) -> bool {
        !self.archived && !self.fork
    }
}

/// A hydrated pull request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequest {
    pub repo: String,
    pub number: u64,
    /// Login of the author. Deleted accounts have none.
    pub author: Option<String>,
    pub is_draft: bool,
    pub is_merged: bool,
    pub merged_at: Option<DateTime<Utc>>,
    pub title: String,
}

/// The verdict GitHub recorded for a review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    #[serde(other)]
    Unknown,
}

/// A single review on a pull request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    pub pr_number: u64,
    pub author: Option<String>,
    pub state: ReviewState,
    /// Pending reviews have not been submitted yet.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An inclusive time range over merge timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Builds a window; a missing `end` means "now".
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end: end.unwrap_or_else(Utc::now),
        }
    }

    /// The `days` days leading up to `now`. A span reaching past the
    /// earliest representable instant starts there instead.
    pub fn trailing_days(days: i64, now: DateTime<Utc>) -> Self {
        let start = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// The `start..end` range in the calendar-day syntax of GitHub search.
    pub fn search_range(&self) -> String {
        format!(
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
