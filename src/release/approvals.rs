use super::{resolve_display_name, PullRequestRef};
use crate::integrations::github::{self, PullRequests, ReviewState, UserDirectory};

/// Approver names are rendered inside one HTML paragraph.
pub(crate) const APPROVER_SEPARATOR: &str = "<br/>";

/// Who released a pull request and who approved it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ApprovalSet {
    pub(crate) released_by: Option<String>,
    /// Display names joined by [`APPROVER_SEPARATOR`], one per approving review.
    pub(crate) approvers: String,
}

impl ApprovalSet {
    /// An empty set means there is nothing to release.
    pub(crate) fn is_empty(&self) -> bool {
        self.released_by.is_none() && self.approvers.is_empty()
    }
}

/// Collect the approvals of `pr`, which was merged by `merged_by`.
///
/// Without a merge actor there is no release, so reviews aren't even fetched. Each approving
/// review is resolved on its own, so someone who approved twice is listed twice.
pub(crate) async fn aggregate_approvals(
    pulls: &dyn PullRequests,
    users: &dyn UserDirectory,
    pr: &PullRequestRef,
    merged_by: Option<&str>,
) -> Result<ApprovalSet, github::Error> {
    let Some(merged_by) = merged_by else {
        return Ok(ApprovalSet::default());
    };
    let released_by = resolve_display_name(users, merged_by).await?;

    let reviews = pulls.reviews(pr).await?;
    let mut names = Vec::new();
    for review in reviews
        .iter()
        .filter(|review| review.state == ReviewState::Approved)
    {
        names.push(resolve_display_name(users, review.reviewer()).await?);
    }

    Ok(ApprovalSet {
        released_by: Some(released_by),
        approvers: names.join(APPROVER_SEPARATOR),
    })
}
