use crate::classifier::ReviewOutcome;
use serde::Serialize;

/// Review coverage for one repository.
///
/// Built once from the outcomes of its merged pull requests and never
/// modified afterwards. `merged_count` is always the sum of the four
/// category counts.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RepoMetrics {
    pub repo: String,
    pub merged_count: usize,
    pub approved: usize,
    pub changes_requested: usize,
    pub commented_only: usize,
    pub no_review: usize,
}

impl RepoMetrics {
    /// Tallies classified pull requests. Drafts are skipped entirely, so
    /// they never enter the denominator.
    pub fn from_outcomes<I>(repo: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = ReviewOutcome>,
    {
        let mut metrics = Self {
            repo: repo.into(),
            merged_count: 0,
            approved: 0,
            changes_requested: 0,
            commented_only: 0,
            no_review: 0,
        };

        for outcome in outcomes {
            let counter = match outcome {
                ReviewOutcome::Approved => &mut metrics.approved,
                ReviewOutcome::ChangesRequested => &mut metrics.changes_requested,
                ReviewOutcome::Commented => &mut metrics.commented_only,
                ReviewOutcome::NoReview => &mut metrics.no_review,
                ReviewOutcome::DraftExcluded => continue,
            };
            *counter += 1;
            metrics.merged_count += 1;
        }

        metrics
    }

    pub fn reviewed_any(&self) -> usize {
        self.approved + self.changes_requested + self.commented_only
    }

    /// `count` as a percentage of merged pull requests; 0 for an idle repository.
    pub fn pct(&self, count: usize) -> f64 {
        if self.merged_count == 0 {
            return 0.0;
        }
        count as f64 / self.merged_count as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ReviewOutcome::*;

    #[test]
    fn test_from_outcomes_empty() {
        let metrics = RepoMetrics::from_outcomes("quiet", Vec::new());

        assert_eq!(metrics.merged_count, 0);
        assert_eq!(metrics.reviewed_any(), 0);
        assert_eq!(metrics.pct(metrics.reviewed_any()), 0.0);
    }

    #[test]
    fn test_from_outcomes_with_data() {
        let metrics = RepoMetrics::from_outcomes("myrepo", [Approved, NoReview, NoReview]);

        assert_eq!(metrics.merged_count, 3);
        assert_eq!(metrics.approved, 1);
        assert_eq!(metrics.changes_requested, 0);
        assert_eq!(metrics.commented_only, 0);
        assert_eq!(metrics.no_review, 2);
        assert_eq!(metrics.reviewed_any(), 1);
        assert!((metrics.pct(1) - 33.333).abs() < 0.001);
    }

    #[test]
    fn test_drafts_are_not_in_the_denominator() {
        let metrics = RepoMetrics::from_outcomes(
            "svc",
            [DraftExcluded, Commented, ChangesRequested, DraftExcluded],
        );

        assert_eq!(metrics.merged_count, 2);
        assert_eq!(metrics.pct(metrics.reviewed_any()), 100.0);
    }

    #[test]
    fn test_counts_always_sum_to_merged() {
        let all = [Approved, ChangesRequested, Commented, NoReview, DraftExcluded];
        // Every combination of up to four outcomes.
        for a in all {
            for b in all {
                for c in all {
                    for d in all {
                        let m = RepoMetrics::from_outcomes("r", [a, b, c, d]);
                        assert_eq!(
                            m.approved + m.changes_requested + m.commented_only + m.no_review,
                            m.merged_count
                        );
                        for x in [m.approved, m.changes_requested, m.commented_only, m.no_review] {
                            let pct = m.pct(x);
                            assert!((0.0..=100.0).contains(&pct));
                        }
                    }
                }
            }
        }
    }
}
