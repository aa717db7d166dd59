//! Organization-wide report.
//!
//! `OrgReportRunner` walks every active repository of an organization one at
//! a time, in name order, pausing between repositories so the run stays well
//! inside GitHub's rate limits.

use crate::config::AppConfig;
use crate::error::ReportError;
use crate::fetcher;
use crate::github::{GitHubApi, OctocrabGitHub};
use crate::metrics::RepoMetrics;
use crate::querier::{PullRequestQuerier, PER_PAGE};
use crate::retry::{BackoffPolicy, RateLimitedFetcher};
use crate::types::{Repository, TimeWindow};
use std::sync::Arc;
use std::time::Duration as StdDuration;

pub struct OrgReportRunner {
    github: Arc<dyn GitHubApi>,
    fetcher: RateLimitedFetcher,
    querier: PullRequestQuerier,
    inter_repo_delay: StdDuration,
}

impl OrgReportRunner {
    /// Builds a runner talking to GitHub with the configured token.
    pub fn new(config: &AppConfig) -> Result<Self, ReportError> {
        let github = OctocrabGitHub::from_config(config)?;
        let fetcher = RateLimitedFetcher::new(BackoffPolicy::from_config(config));
        Ok(Self::with_github(Arc::new(github), fetcher, config))
    }

    /// Builds a runner on top of any `GitHubApi` implementation.
    pub fn with_github(
        github: Arc<dyn GitHubApi>,
        fetcher: RateLimitedFetcher,
        config: &AppConfig,
    ) -> Self {
        let querier =
            PullRequestQuerier::new(github.clone(), fetcher.clone(), config.max_search_pages);
        Self {
            github,
            fetcher,
            querier,
            inter_repo_delay: config.inter_repo_delay(),
        }
    }

    /// Computes review coverage for every eligible repository of `org`.
    ///
    /// `on_repo` sees each row as soon as its repository is finished. Rows
    /// come back in the order repositories were visited. The first failing
    /// repository stops the run.
    pub async fn run<F>(
        &self,
        org: &str,
        window: &TimeWindow,
        mut on_repo: F,
    ) -> Result<Vec<RepoMetrics>, ReportError>
    where
        F: FnMut(&RepoMetrics),
    {
        let repos = self.eligible_repositories(org).await?;
        tracing::info!(org = %org, repos = repos.len(), window = %window, "Starting review coverage report");

        let mut rows = Vec::with_capacity(repos.len());
        for (index, repo) in repos.iter().enumerate() {
            let metrics =
                fetcher::fetch_and_calculate_metrics(&self.querier, org, &repo.name, window)
                    .await?;
            tracing::info!(
                repo = %repo.name,
                merged = metrics.merged_count,
                reviewed_any = metrics.reviewed_any(),
                no_review = metrics.no_review,
                "Finished repository"
            );
            on_repo(&metrics);
            rows.push(metrics);

            if index + 1 < repos.len() {
                tokio::time::sleep(self.inter_repo_delay).await;
            }
        }

        Ok(rows)
    }

    /// Lists the organization's repositories, minus archived ones and forks,
    /// sorted by name.
    async fn eligible_repositories(&self, org: &str) -> Result<Vec<Repository>, ReportError> {
        let label = format!("list repositories {org}");
        let mut repos = Vec::new();
        let mut page = 1;

        loop {
            let batch = self
                .fetcher
                .execute(&label, || {
                    self.github.list_org_repositories(org, page, PER_PAGE)
                })
                .await?;
            let batch_len = batch.len();
            repos.extend(batch.into_iter().filter(Repository::is_eligible));

            if batch_len < usize::from(PER_PAGE) {
                break;
            }
            page += 1;
        }

        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }
}
