//! Access to the GitHub REST and Search APIs.
//!
//! `GitHubApi` is the narrow surface the report needs; `OctocrabGitHub`
//! implements it on top of octocrab's raw `get`, with small serde payload
//! types instead of octocrab's full models.

use crate::config::AppConfig;
use crate::error::ReportError;
use crate::types::{PullRequest, Repository, Review, ReviewState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::{StatusCode, Uri};
use octocrab::{Octocrab, Page};
use serde::Deserialize;

/// One page of issue search results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total hits across all pages, as reported by GitHub.
    pub total_count: u64,
    /// Pull request numbers on this page.
    pub numbers: Vec<u64>,
}

#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn list_org_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Repository>, ReportError>;

    async fn search_pull_requests(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, ReportError>;

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ReportError>;

    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Review>, ReportError>;
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiIssue {
    number: u64,
}

#[derive(Deserialize)]
struct ApiPullRequest {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user: Option<ApiUser>,
    #[serde(default)]
    draft: Option<bool>,
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ApiReview {
    #[serde(default)]
    user: Option<ApiUser>,
    state: ReviewState,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ApiRateLimit {
    resources: ApiRateResources,
}

#[derive(Deserialize)]
struct ApiRateResources {
    core: ApiRate,
    search: Option<ApiRate>,
}

#[derive(Deserialize)]
struct ApiRate {
    reset: i64,
}

/// Which rate limit bucket a call draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RateResource {
    Core,
    Search,
}

pub struct OctocrabGitHub {
    octocrab: Octocrab,
}

impl OctocrabGitHub {
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self, ReportError> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(api_url) = api_url {
            let base_uri: Uri = api_url.parse().map_err(|e| ReportError::Configuration {
                message: format!("invalid GITHUB_API_URL '{api_url}': {e}"),
            })?;
            builder = builder
                .base_uri(base_uri)
                .map_err(|e| ReportError::Configuration {
                    message: format!("invalid GITHUB_API_URL '{api_url}': {e}"),
                })?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| map_octocrab_error("build client", &e))?;
        Ok(Self { octocrab })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ReportError> {
        Self::new(&config.github_token, config.github_api_url.as_deref())
    }

    /// Maps an octocrab failure. An exhausted quota gets its reset time
    /// from `/rate_limit`; a secondary limit leaves it unknown, since the
    /// buckets there do not describe it.
    async fn map_error(
        &self,
        operation: &str,
        resource: RateResource,
        error: octocrab::Error,
    ) -> ReportError {
        let mut mapped = map_octocrab_error(operation, &error);
        if classify_failure(&error) == Failure::QuotaExhausted {
            if let ReportError::RateLimited { reset_at, .. } = &mut mapped {
                *reset_at = self.fetch_reset_time(resource).await;
            }
        }
        mapped
    }

    async fn fetch_reset_time(&self, resource: RateResource) -> Option<DateTime<Utc>> {
        let limits: ApiRateLimit = self
            .octocrab
            .get("/rate_limit", None::<&()>)
            .await
            .map_err(|e| tracing::debug!("Could not read rate limit status: {}", e))
            .ok()?;
        let rate = match resource {
            RateResource::Search => limits.resources.search.unwrap_or(limits.resources.core),
            RateResource::Core => limits.resources.core,
        };
        DateTime::from_timestamp(rate.reset, 0)
    }
}

#[async_trait]
impl GitHubApi for OctocrabGitHub {
    async fn list_org_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Repository>, ReportError> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let params = [
            ("type", "all"),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];

        let result: Result<Page<Repository>, _> = self
            .octocrab
            .get(format!("/orgs/{org}/repos"), Some(&params))
            .await;
        match result {
            Ok(page) => Ok(page.items),
            Err(e) => Err(self.map_error("list repositories", RateResource::Core, e).await),
        }
    }

    async fn search_pull_requests(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, ReportError> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let params = [
            ("q", query),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];

        let result: Result<Page<ApiIssue>, _> =
            self.octocrab.get("/search/issues", Some(&params)).await;
        match result {
            Ok(page) => Ok(SearchPage {
                total_count: page.total_count.unwrap_or_default(),
                numbers: page.items.into_iter().map(|issue| issue.number).collect(),
            }),
            Err(e) => Err(self.map_error("search pull requests", RateResource::Search, e).await),
        }
    }

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ReportError> {
        let result: Result<ApiPullRequest, _> = self
            .octocrab
            .get(format!("/repos/{owner}/{repo}/pulls/{number}"), None::<&()>)
            .await;
        match result {
            Ok(pr) => Ok(PullRequest {
                repo: repo.to_string(),
                number: pr.number,
                author: pr.user.map(|user| user.login),
                is_draft: pr.draft.unwrap_or(false),
                is_merged: pr.merged.unwrap_or(pr.merged_at.is_some()),
                merged_at: pr.merged_at,
                title: pr.title.unwrap_or_default(),
            }),
            Err(e) => Err(self.map_error("get pull request", RateResource::Core, e).await),
        }
    }

    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Review>, ReportError> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let params = [("page", page.as_str()), ("per_page", per_page.as_str())];

        let result: Result<Page<ApiReview>, _> = self
            .octocrab
            .get(
                format!("/repos/{owner}/{repo}/pulls/{number}/reviews"),
                Some(&params),
            )
            .await;
        match result {
            Ok(page) => Ok(page
                .items
                .into_iter()
                .map(|review| Review {
                    pr_number: number,
                    author: review.user.map(|user| user.login),
                    state: review.state,
                    submitted_at: review.submitted_at,
                })
                .collect()),
            Err(e) => Err(self.map_error("list reviews", RateResource::Core, e).await),
        }
    }
}

/// How a failed call is reported, decided once per octocrab error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Failure {
    /// The hourly quota is spent; `/rate_limit` says when it refills.
    QuotaExhausted,
    /// Abuse detection. Its reset is not published anywhere.
    SecondaryLimit,
    Credentials,
    Rejected,
    Transport,
    Client,
}

const fn is_credentials_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

const fn is_transport_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. } | octocrab::Error::Hyper { .. } | octocrab::Error::Service { .. }
    )
}

fn classify_failure(error: &octocrab::Error) -> Failure {
    let octocrab::Error::GitHub { source, .. } = error else {
        return if is_transport_error(error) {
            Failure::Transport
        } else {
            Failure::Client
        };
    };

    // Rate limits come back as 403 or 429, named either in the message or
    // in the documentation link.
    let message = source.message.to_lowercase();
    let names_rate_limit = message.contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));
    let limited = names_rate_limit
        && matches!(
            source.status_code,
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        );

    if limited && message.contains("secondary rate limit") {
        Failure::SecondaryLimit
    } else if limited {
        Failure::QuotaExhausted
    } else if is_credentials_status(source.status_code) {
        Failure::Credentials
    } else {
        Failure::Rejected
    }
}

/// Maps a failure that needs no rate limit lookup.
fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> ReportError {
    let failure = classify_failure(error);
    let octocrab::Error::GitHub { source, .. } = error else {
        let message = format!("{operation}: {error}");
        return match failure {
            Failure::Transport => ReportError::Network { message },
            _ => ReportError::Api { message },
        };
    };

    let detail = format!("{operation}: HTTP {} {}", source.status_code, source.message);
    match failure {
        Failure::QuotaExhausted | Failure::SecondaryLimit => ReportError::RateLimited {
            reset_at: None,
            message: detail,
        },
        Failure::Credentials => ReportError::Authorization {
            message: format!("{detail} (check GITHUB_TOKEN and its org access)"),
        },
        Failure::Rejected | Failure::Transport | Failure::Client => {
            ReportError::Api { message: detail }
        }
    }
}
