//! Classification of a merged pull request by the reviews it received.

use crate::types::{PullRequest, Review, ReviewState};

/// How a pull request was reviewed before it was merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReviewOutcome {
    Approved,
    ChangesRequested,
    Commented,
    NoReview,
    /// Drafts are not counted as merged work at all.
    DraftExcluded,
}

/// Classifies `pr` given the reviews submitted before it was merged.
///
/// Reviews by the PR's own author never count. Among the rest, an approval
/// outranks a change request, which outranks a plain comment. Reviews in any
/// other state (dismissed, pending) count as no review.
pub fn classify(pr: &PullRequest, reviews: &[Review]) -> ReviewOutcome {
    if pr.is_draft {
        return ReviewOutcome::DraftExcluded;
    }

    let mut best = ReviewOutcome::NoReview;
    for review in reviews.iter().filter(|r| !is_self_review(pr, r)) {
        match review.state {
            ReviewState::Approved => return ReviewOutcome::Approved,
            ReviewState::ChangesRequested => best = ReviewOutcome::ChangesRequested,
            ReviewState::Commented if best == ReviewOutcome::NoReview => {
                best = ReviewOutcome::Commented
            }
            ReviewState::Commented
            | ReviewState::Dismissed
            | ReviewState::Pending
            | ReviewState::Unknown => {}
        }
    }
    best
}

fn is_self_review(pr: &PullRequest, review: &Review) -> bool {
    match (&pr.author, &review.author) {
        (Some(author), Some(reviewer)) => author.eq_ignore_ascii_case(reviewer),
        _ => false,
    }
}
