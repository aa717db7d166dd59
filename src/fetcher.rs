use crate::classifier;
use crate::error::ReportError;
use crate::metrics::RepoMetrics;
use crate::querier::PullRequestQuerier;
use crate::types::TimeWindow;

/// Fetches a repository's merged PRs and their reviews and tallies review coverage.
///
/// Drafts are dropped before any reviews are fetched. A failure on any
/// single pull request aborts the whole repository, so a returned
/// `RepoMetrics` always covers every merged PR that was found.
pub async fn fetch_and_calculate_metrics(
    querier: &PullRequestQuerier,
    org: &str,
    repo: &str,
    window: &TimeWindow,
) -> Result<RepoMetrics, ReportError> {
    let prs = querier.merged_pull_requests(org, repo, window).await?;

    let mut outcomes = Vec::with_capacity(prs.len());
    for pr in prs.iter().filter(|pr| !pr.is_draft) {
        let Some(merged_at) = pr.merged_at else {
            continue;
        };
        let reviews = querier
            .pre_merge_reviews(org, repo, pr.number, merged_at)
            .await?;
        let outcome = classifier::classify(pr, &reviews);
        tracing::debug!(repo = %repo, pr = pr.number, ?outcome, "Classified pull request");
        outcomes.push(outcome);
    }

    Ok(RepoMetrics::from_outcomes(repo, outcomes))
}
