//! Turning a merged pull request into a [`ReleaseRecord`].
//!
//! Every remote call here is awaited one at a time, in order. Approver names in particular must
//! come out in the same order GitHub returned the reviews.

use std::fmt::{self, Display};

use self::{
    approvals::aggregate_approvals,
    identity::resolve_display_name,
    notes::{extract_notes, render_content},
};
pub(crate) use self::{
    merged::list_merged_pull_requests,
    notes::RELEASE_MARKER,
    record::{Error, RecordBuilder, ReleaseRecord},
};

mod approvals;
mod identity;
mod merged;
mod notes;
mod record;

/// Identifies one pull request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PullRequestRef {
    pub(crate) owner: String,
    pub(crate) repo: String,
    pub(crate) pull_number: u64,
}

impl PullRequestRef {
    pub(crate) fn new(owner: impl Into<String>, repo: impl Into<String>, pull_number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            pull_number,
        }
    }
}

impl Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pull_number)
    }
}
