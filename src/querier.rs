//! Querying merged pull requests and their reviews.
//!
//! This module implements `PullRequestQuerier`, which turns paged GitHub
//! responses into the records the classifier works on. It handles:
//! 1. Searching for PRs merged inside a window and hydrating each hit.
//! 2. Guarding against a search index that lags behind the PR itself.
//! 3. Collecting the reviews submitted before a PR was merged.
//!
//! Every call goes through the `RateLimitedFetcher`, so rate limits are waited
//! out while any other failure aborts the query.

use crate::error::ReportError;
use crate::github::GitHubApi;
use crate::retry::RateLimitedFetcher;
use crate::types::{PullRequest, Review, TimeWindow};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// GitHub's maximum page size.
pub const PER_PAGE: u8 = 100;

#[derive(Clone)]
pub struct PullRequestQuerier {
    github: Arc<dyn GitHubApi>,
    fetcher: RateLimitedFetcher,
    max_search_pages: u32,
}

impl PullRequestQuerier {
    pub fn new(
        github: Arc<dyn GitHubApi>,
        fetcher: RateLimitedFetcher,
        max_search_pages: u32,
    ) -> Self {
        Self {
            github,
            fetcher,
            max_search_pages,
        }
    }

    /// Retrieves the pull requests of `org/repo` merged within `window`.
    ///
    /// Search hits are only candidates: each one is re-read from the pull
    /// request endpoint and kept only if that authoritative record is merged
    /// inside the window. The search index can lag, so a mismatch is dropped
    /// quietly rather than reported.
    pub async fn merged_pull_requests(
        &self,
        org: &str,
        repo: &str,
        window: &TimeWindow,
    ) -> Result<Vec<PullRequest>, ReportError> {
        let query = merged_search_query(org, repo, window);
        let query = query.as_str();
        let search_label = format!("search {org}/{repo}");
        let hydrate_label = format!("get pull request {org}/{repo}");

        let mut prs = Vec::new();
        let mut seen = HashSet::new();
        let mut fetched: u64 = 0;
        let mut hit_page_limit = true;

        for page in 1..=self.max_search_pages {
            let results = self
                .fetcher
                .execute(&search_label, || {
                    self.github.search_pull_requests(query, page, PER_PAGE)
                })
                .await?;

            if results.numbers.is_empty() {
                hit_page_limit = false;
                break;
            }
            fetched += results.numbers.len() as u64;

            for number in results.numbers {
                if !seen.insert(number) {
                    continue;
                }
                let pr = self
                    .fetcher
                    .execute(&hydrate_label, || {
                        self.github.get_pull_request(org, repo, number)
                    })
                    .await?;

                if is_merged_within(&pr, window) {
                    prs.push(pr);
                } else {
                    tracing::debug!(
                        repo = %repo,
                        pr = number,
                        merged_at = ?pr.merged_at,
                        "Search hit is not merged inside the window; skipping"
                    );
                }
            }

            if fetched >= results.total_count {
                hit_page_limit = false;
                break;
            }
        }

        if hit_page_limit {
            tracing::warn!(
                org = %org,
                repo = %repo,
                max_search_pages = self.max_search_pages,
                "Hit max_search_pages before exhausting search results. Data may be incomplete."
            );
        }

        Ok(prs)
    }

    /// Retrieves the reviews on a pull request submitted strictly before `merged_at`.
    ///
    /// Reviews come back in the order GitHub returns them, which is
    /// submission order.
    pub async fn pre_merge_reviews(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        merged_at: DateTime<Utc>,
    ) -> Result<Vec<Review>, ReportError> {
        let label = format!("list reviews {org}/{repo}#{number}");
        let mut reviews = Vec::new();
        let mut page = 1;

        loop {
            let batch = self
                .fetcher
                .execute(&label, || {
                    self.github.list_reviews(org, repo, number, page, PER_PAGE)
                })
                .await?;
            let batch_len = batch.len();

            reviews.extend(
                batch
                    .into_iter()
                    .filter(|review| review.submitted_at.is_some_and(|at| at < merged_at)),
            );

            // A short page is the last page.
            if batch_len < usize::from(PER_PAGE) {
                break;
            }
            page += 1;
        }

        Ok(reviews)
    }
}

/// The search query for PRs of `org/repo` merged on the window's calendar days.
pub fn merged_search_query(org: &str, repo: &str, window: &TimeWindow) -> String {
    format!(
        "repo:{org}/{repo} is:pr is:merged merged:{}",
        window.search_range()
    )
}

fn is_merged_within(pr: &PullRequest, window: &TimeWindow) -> bool {
    pr.is_merged && pr.merged_at.is_some_and(|at| window.contains(at))
}
