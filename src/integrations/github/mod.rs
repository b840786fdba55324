use async_trait::async_trait;
use log::debug;
use miette::Diagnostic;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

pub(crate) use self::{
    pull_requests::{Account, Base, PullRequest, PullRequestSummary, Repository, Review, ReviewState},
    users::User,
};
use crate::{config, release::PullRequestRef};

#[cfg(test)]
pub(crate) mod fake;
mod pull_requests;
mod users;

/// Read access to GitHub accounts.
#[async_trait]
pub(crate) trait UserDirectory: Send + Sync {
    async fn user(&self, login: &str) -> Result<User, Error>;
}

/// Read access to pull requests and their reviews.
#[async_trait]
pub(crate) trait PullRequests: Send + Sync {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequest, Error>;

    /// Every review on `pr`, in the order GitHub returns them.
    async fn reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, Error>;

    /// One page of closed pull requests, most recently updated first.
    async fn closed_pull_requests(
        &self,
        query: &ClosedQuery<'_>,
    ) -> Result<Vec<PullRequestSummary>, Error>;
}

/// Parameters for a single page of [`PullRequests::closed_pull_requests`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct ClosedQuery<'a> {
    pub(crate) owner: &'a str,
    pub(crate) repo: &'a str,
    pub(crate) base: &'a str,
    pub(crate) page: u32,
    pub(crate) per_page: u32,
}

/// A client for the GitHub REST API.
#[derive(Clone, Debug)]
pub(crate) struct GitHub {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHub {
    /// Requests are anonymous when `token` is `None`, which only works for public repos and is
    /// heavily rate limited.
    pub(crate) fn new(client: Client, config: &config::GitHub, token: Option<String>) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{path}", self.api_url))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "docket")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        activity: String,
    ) -> Result<T, Error> {
        debug!("Calling GitHub while {activity}");
        request
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| Error::ApiRequest {
                status: source.status(),
                err: source.to_string(),
                activity: activity.clone(),
            })?
            .json()
            .await
            .map_err(|source| Error::ApiResponse { source, activity })
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Trouble communicating with GitHub while {activity}: {err}")]
    #[diagnostic(
        code(github::api_request_error),
        help(
            "There was a problem communicating with GitHub, this may be a network issue or a permissions issue. Make sure GITHUB_TOKEN can read the repository."
        )
    )]
    ApiRequest {
        err: String,
        activity: String,
        status: Option<StatusCode>,
    },
    #[error("Trouble decoding the response from GitHub while {activity}: {source}")]
    #[diagnostic(
        code(github::api_response_error),
        help("GitHub returned data in a shape docket does not understand.")
    )]
    ApiResponse {
        source: reqwest::Error,
        activity: String,
    },
}

impl Error {
    /// The HTTP status GitHub answered with, if the request got that far.
    pub(crate) fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ApiRequest { status, .. } => *status,
            Self::ApiResponse { .. } => None,
        }
    }
}
