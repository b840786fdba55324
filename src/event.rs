use std::{fs, path::PathBuf};

use miette::Diagnostic;
use serde::Deserialize;

use crate::release::PullRequestRef;

/// Set by GitHub Actions to the JSON payload of the event that triggered the run.
pub(crate) const GITHUB_EVENT_PATH: &str = "GITHUB_EVENT_PATH";

#[derive(Deserialize)]
struct Event {
    pull_request: EventPullRequest,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
    base: EventBase,
}

#[derive(Deserialize)]
struct EventBase {
    repo: EventRepo,
}

#[derive(Deserialize)]
struct EventRepo {
    name: String,
    owner: EventOwner,
}

#[derive(Deserialize)]
struct EventOwner {
    login: String,
}

/// The pull request the current GitHub Actions run is about.
pub(crate) fn pull_request_from_env() -> Result<PullRequestRef, Error> {
    let path = std::env::var_os(GITHUB_EVENT_PATH)
        .filter(|path| !path.is_empty())
        .ok_or(Error::NoEvent)?;
    pull_request_from_event(PathBuf::from(path))
}

/// Read the target pull request out of the event payload at `path`.
pub(crate) fn pull_request_from_event(path: PathBuf) -> Result<PullRequestRef, Error> {
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(source) => return Err(Error::Read { path, source }),
    };
    let event: Event = match serde_json::from_str(&contents) {
        Ok(event) => event,
        Err(source) => return Err(Error::Parse { path, source }),
    };
    let pull = event.pull_request;
    Ok(PullRequestRef::new(
        pull.base.repo.owner.login,
        pull.base.repo.name,
        pull.number,
    ))
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("No pull request to publish")]
    #[diagnostic(
        code(event::none),
        help("Pass --owner, --repo and --pr, or run from a pull_request workflow in GitHub Actions.")
    )]
    NoEvent,
    #[error("Could not read the event payload at {path}: {source}")]
    #[diagnostic(code(event::read))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("The event payload at {path} is not about a pull request: {source}")]
    #[diagnostic(
        code(event::parse),
        help("docket only runs on pull_request events when no pull request is passed in.")
    )]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
