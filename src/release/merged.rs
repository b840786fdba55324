use log::{error, info};
use reqwest::StatusCode;

use super::PullRequestRef;
use crate::integrations::github::{self, ClosedQuery, PullRequests};

/// GitHub's largest page size.
pub(crate) const PAGE_SIZE: u32 = 100;

/// Every merged pull request into `base`, most recently updated first.
///
/// Any failure is logged and results in an empty list, so an empty result can also mean that
/// listing didn't work.
pub(crate) async fn list_merged_pull_requests(
    pulls: &dyn PullRequests,
    owner: &str,
    repo: &str,
    base: &str,
) -> Vec<PullRequestRef> {
    info!("Fetching merged PRs for {owner}/{repo} into {base}...");
    match collect_merged(pulls, owner, repo, base).await {
        Ok(merged) => merged,
        Err(err) => {
            error!("Error fetching PRs: {err}");
            let status = err.status();
            if status == Some(StatusCode::UNAUTHORIZED) {
                error!("Authentication failed. Make sure GITHUB_TOKEN is set correctly.");
            } else if status == Some(StatusCode::NOT_FOUND) {
                error!("Repository not found. Check the owner and repo values.");
            }
            Vec::new()
        }
    }
}

async fn collect_merged(
    pulls: &dyn PullRequests,
    owner: &str,
    repo: &str,
    base: &str,
) -> Result<Vec<PullRequestRef>, github::Error> {
    let mut merged = Vec::new();
    for page in 1.. {
        info!("Fetching page {page}...");
        let closed = pulls
            .closed_pull_requests(&ClosedQuery {
                owner,
                repo,
                base,
                page,
                per_page: PAGE_SIZE,
            })
            .await?;
        if closed.is_empty() {
            info!("No more PRs found.");
            break;
        }

        let total = closed.len();
        let before = merged.len();
        merged.extend(
            closed
                .into_iter()
                .filter(|pull| pull.merged_at.is_some())
                .map(|pull| PullRequestRef::new(owner, repo, pull.number)),
        );
        info!(
            "Found {} merged PRs on page {page} ({total} total PRs)",
            merged.len() - before
        );

        if total < PAGE_SIZE as usize {
            info!("Reached last page.");
            break;
        }
    }
    Ok(merged)
}
