use log::debug;
use miette::Diagnostic;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime, UtcOffset};

use super::{
    aggregate_approvals, extract_notes, notes::decode_entities, render_content,
    resolve_display_name, PullRequestRef,
};
use crate::{
    config,
    integrations::github::{self, PullRequests, UserDirectory},
};

/// For example `Jan 5, 2025 - 09:03`.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year] - [hour]:[minute]");

/// Everything the renderers need to know about one released pull request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReleaseRecord {
    /// Entity-decoded title of the pull request.
    pub(crate) title: String,
    pub(crate) repo: String,
    pub(crate) number: u64,
    /// `merged_at`, formatted for people.
    pub(crate) date: String,
    /// The release notes as HTML, empty if there were none.
    pub(crate) content: String,
    pub(crate) approvers: String,
    pub(crate) created_by: String,
    pub(crate) released_by: String,
    /// Like `3 files`.
    pub(crate) files: String,
    pub(crate) url: String,
    pub(crate) merged_at: OffsetDateTime,
}

impl ReleaseRecord {
    /// `merged_at` in seconds since the Unix epoch.
    pub(crate) fn timestamp(&self) -> i64 {
        self.merged_at.unix_timestamp()
    }

    #[cfg(test)]
    pub(crate) fn sample() -> Self {
        Self {
            title: "Fix & polish".to_string(),
            repo: "da-live".to_string(),
            number: 71,
            date: "Jan 5, 2025 - 09:03".to_string(),
            content: "<ul>\n<li>Fixed the thing</li>\n</ul>\n".to_string(),
            approvers: "First Reviewer<br/>second".to_string(),
            created_by: "The Author".to_string(),
            released_by: "Merge Person".to_string(),
            files: "3 files".to_string(),
            url: "https://github.com/adobe/da-live/pull/71".to_string(),
            merged_at: time::macros::datetime!(2025-01-05 09:03 UTC),
        }
    }
}

/// Builds [`ReleaseRecord`]s from GitHub data.
pub(crate) struct RecordBuilder<'a> {
    pulls: &'a dyn PullRequests,
    users: &'a dyn UserDirectory,
    notes: &'a config::Notes,
}

impl<'a> RecordBuilder<'a> {
    pub(crate) fn new(
        pulls: &'a dyn PullRequests,
        users: &'a dyn UserDirectory,
        notes: &'a config::Notes,
    ) -> Self {
        Self {
            pulls,
            users,
            notes,
        }
    }

    /// Gather everything about `pr` into a record.
    ///
    /// Returns `Ok(None)` when nobody merged the pull request, in which case nothing should be
    /// published for it.
    pub(crate) async fn build(&self, pr: &PullRequestRef) -> Result<Option<ReleaseRecord>, Error> {
        let pull = self.pulls.pull_request(pr).await?;

        let merged_by = pull.merged_by.as_ref().map(|account| account.login.as_str());
        let approvals = aggregate_approvals(self.pulls, self.users, pr, merged_by).await?;
        if approvals.is_empty() {
            debug!("{pr} has no merge actor");
            return Ok(None);
        }
        let merged_at = pull.merged_at.ok_or_else(|| Error::NotMerged { pr: pr.to_string() })?;

        let notes = extract_notes(pull.body.as_deref(), &self.notes.marker, &self.notes.default);
        let created_by = resolve_display_name(self.users, &pull.user.login).await?;

        Ok(Some(ReleaseRecord {
            title: decode_entities(&pull.title),
            repo: pull.base.repo.name,
            number: pull.number,
            date: format_date(merged_at)?,
            content: render_content(&notes),
            approvers: approvals.approvers,
            created_by,
            released_by: approvals.released_by.unwrap_or_default(),
            files: files_phrase(pull.changed_files),
            url: pull.html_url,
            merged_at,
        }))
    }
}

/// The release date as shown to readers, always in UTC.
pub(crate) fn format_date(merged_at: OffsetDateTime) -> Result<String, time::error::Format> {
    merged_at.to_offset(UtcOffset::UTC).format(DATE_FORMAT)
}

pub(crate) fn files_phrase(changed_files: u64) -> String {
    if changed_files == 1 {
        "1 file".to_string()
    } else {
        format!("{changed_files} files")
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    GitHub(#[from] github::Error),
    #[error("{pr} has a merge actor but no merge time")]
    #[diagnostic(
        code(release::not_merged),
        help("GitHub reported inconsistent data for this pull request, try again later.")
    )]
    NotMerged { pr: String },
    #[error("Could not format the merge date: {0}")]
    #[diagnostic(code(release::date_format))]
    DateFormat(#[from] time::error::Format),
}
