use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;

use super::{ClosedQuery, Error, GitHub, PullRequests};
use crate::release::PullRequestRef;

/// GitHub attributes reviews from deleted accounts to this login.
const GHOST: &str = "ghost";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct Account {
    pub(crate) login: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct Repository {
    pub(crate) name: String,
    pub(crate) owner: Account,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct Base {
    pub(crate) repo: Repository,
}

/// The subset of a pull request that release notes are built from.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PullRequest {
    pub(crate) number: u64,
    pub(crate) title: String,
    pub(crate) body: Option<String>,
    pub(crate) html_url: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) merged_at: Option<OffsetDateTime>,
    pub(crate) merged_by: Option<Account>,
    pub(crate) changed_files: u64,
    pub(crate) user: Account,
    pub(crate) base: Base,
}

/// An entry of the closed pull request listing. Only merged ones carry `merged_at`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PullRequestSummary {
    pub(crate) number: u64,
    pub(crate) merged_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Review {
    pub(crate) user: Option<Account>,
    pub(crate) state: ReviewState,
}

impl Review {
    pub(crate) fn reviewer(&self) -> &str {
        self.user
            .as_ref()
            .map_or(GHOST, |account| account.login.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub(crate) enum ReviewState {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(other)]
    Other,
}

#[async_trait]
impl PullRequests for GitHub {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequest, Error> {
        let PullRequestRef {
            owner,
            repo,
            pull_number,
        } = pr;
        let request = self.get(&format!("/repos/{owner}/{repo}/pulls/{pull_number}"));
        self.fetch(request, format!("fetching pull request {pr}"))
            .await
    }

    async fn reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, Error> {
        let PullRequestRef {
            owner,
            repo,
            pull_number,
        } = pr;
        let request = self
            .get(&format!("/repos/{owner}/{repo}/pulls/{pull_number}/reviews"))
            .query(&[("per_page", "100")]);
        self.fetch(request, format!("fetching reviews for {pr}"))
            .await
    }

    async fn closed_pull_requests(
        &self,
        query: &ClosedQuery<'_>,
    ) -> Result<Vec<PullRequestSummary>, Error> {
        let ClosedQuery {
            owner,
            repo,
            base,
            page,
            per_page,
        } = *query;
        let page = page.to_string();
        let per_page = per_page.to_string();
        let request = self.get(&format!("/repos/{owner}/{repo}/pulls")).query(&[
            ("state", "closed"),
            ("base", base),
            ("sort", "updated"),
            ("direction", "desc"),
            ("per_page", per_page.as_str()),
            ("page", page.as_str()),
        ]);
        self.fetch(
            request,
            format!("listing page {page} of closed pull requests for {owner}/{repo}"),
        )
        .await
    }
}
