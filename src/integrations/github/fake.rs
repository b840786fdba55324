//! In-memory stand-in for GitHub which records every call it receives.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use time::macros::datetime;

use super::*;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Calls {
    pub(crate) users: Vec<String>,
    pub(crate) pull_requests: usize,
    pub(crate) reviews: usize,
    pub(crate) pages: Vec<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeGitHub {
    /// login -> display name
    pub(crate) users: HashMap<String, Option<String>>,
    /// Only returned for refs to its own repository.
    pub(crate) pull_request: Option<PullRequest>,
    pub(crate) reviews: Vec<Review>,
    pub(crate) pages: Vec<Vec<PullRequestSummary>>,
    /// Answer listing requests from this page onward with this status instead of `pages`.
    pub(crate) listing_error: Option<(u32, StatusCode)>,
    pub(crate) calls: Mutex<Calls>,
}

impl FakeGitHub {
    pub(crate) fn with_user(mut self, login: &str, name: Option<&str>) -> Self {
        self.users
            .insert(login.to_string(), name.map(ToString::to_string));
        self
    }

    pub(crate) fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

fn failure(status: StatusCode, activity: &str) -> Error {
    Error::ApiRequest {
        err: status.to_string(),
        activity: activity.to_string(),
        status: Some(status),
    }
}

pub(crate) fn account(login: &str) -> Account {
    Account {
        login: login.to_string(),
    }
}

pub(crate) fn review(login: &str, state: ReviewState) -> Review {
    Review {
        user: Some(account(login)),
        state,
    }
}

pub(crate) fn summary(number: u64, merged: bool) -> PullRequestSummary {
    PullRequestSummary {
        number,
        merged_at: merged.then(|| "2025-01-05T09:03:00Z".to_string()),
    }
}

/// A merged pull request in `adobe/da-live`.
pub(crate) fn pull_request(body: Option<&str>) -> PullRequest {
    PullRequest {
        number: 71,
        title: "Fix &amp; polish".to_string(),
        body: body.map(ToString::to_string),
        html_url: "https://github.com/adobe/da-live/pull/71".to_string(),
        merged_at: Some(datetime!(2025-01-05 09:03 UTC)),
        merged_by: Some(account("merger")),
        changed_files: 3,
        user: account("author"),
        base: Base {
            repo: Repository {
                name: "da-live".to_string(),
                owner: account("adobe"),
            },
        },
    }
}

#[async_trait]
impl UserDirectory for FakeGitHub {
    async fn user(&self, login: &str) -> Result<User, Error> {
        self.calls.lock().unwrap().users.push(login.to_string());
        self.users
            .get(login)
            .map(|name| User {
                login: login.to_string(),
                name: name.clone(),
            })
            .ok_or_else(|| failure(StatusCode::NOT_FOUND, "looking up user"))
    }
}

#[async_trait]
impl PullRequests for FakeGitHub {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequest, Error> {
        self.calls.lock().unwrap().pull_requests += 1;
        self.pull_request
            .clone()
            .filter(|pull| pull.base.repo.name == pr.repo)
            .ok_or_else(|| failure(StatusCode::NOT_FOUND, "fetching pull request"))
    }

    async fn reviews(&self, _pr: &PullRequestRef) -> Result<Vec<Review>, Error> {
        self.calls.lock().unwrap().reviews += 1;
        Ok(self.reviews.clone())
    }

    async fn closed_pull_requests(
        &self,
        query: &ClosedQuery<'_>,
    ) -> Result<Vec<PullRequestSummary>, Error> {
        self.calls.lock().unwrap().pages.push(query.page);
        if let Some((from_page, status)) = self.listing_error {
            if query.page >= from_page {
                return Err(failure(status, "listing pull requests"));
            }
        }
        let index = query.page.saturating_sub(1) as usize;
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }
}
