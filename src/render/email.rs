use async_trait::async_trait;
use log::info;
use miette::Diagnostic;
use reqwest::Client;
use serde::Serialize;

use super::{Channel, Renderer};
use crate::{
    config,
    integrations::email::{self, Message},
    release::ReleaseRecord,
    state::RunType,
};

/// What the mail template gets to fill in.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TemplateFields<'a> {
    title: &'a str,
    repo: &'a str,
    date: &'a str,
    content: &'a str,
    approvers: &'a str,
    created_by: &'a str,
    released_by: &'a str,
    files: &'a str,
    url: &'a str,
    timestamp: i64,
}

impl<'a> From<&'a ReleaseRecord> for TemplateFields<'a> {
    fn from(record: &'a ReleaseRecord) -> Self {
        Self {
            title: &record.title,
            repo: &record.repo,
            date: &record.date,
            content: &record.content,
            approvers: &record.approvers,
            created_by: &record.created_by,
            released_by: &record.released_by,
            files: &record.files,
            url: &record.url,
            timestamp: record.timestamp(),
        }
    }
}

/// Sends one templated email per release.
pub(crate) struct EmailNotifier {
    client: Client,
    config: config::Email,
    api_key: String,
}

impl EmailNotifier {
    pub(crate) fn new(client: Client, config: config::Email, api_key: String) -> Self {
        Self {
            client,
            config,
            api_key,
        }
    }
}

#[async_trait]
impl Renderer for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn deliver(&self, record: &ReleaseRecord, run_type: RunType) -> Result<(), super::Error> {
        let recipients = self.config.to.join(", ");
        if run_type == RunType::DryRun {
            info!(
                "Would email {recipients} about {}#{} using template {}",
                record.repo, record.number, self.config.template_id
            );
            return Ok(());
        }

        let message = Message::new(
            &self.config.from,
            &self.config.to,
            &self.config.template_id,
            TemplateFields::from(record),
        );
        let status = email::send(&self.client, &self.config.endpoint, &self.api_key, &message)
            .await
            .map_err(Error::from)?;
        info!("Email to {recipients} sent with status {status}");
        Ok(())
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Send(#[from] email::Error),
}
