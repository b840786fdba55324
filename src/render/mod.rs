use std::{
    fmt::{self, Display},
    str::FromStr,
};

use async_trait::async_trait;
use miette::Diagnostic;
use reqwest::Client;

pub(crate) use self::{document::DocumentPublisher, email::EmailNotifier};
use crate::{
    app_config::{self, Credentials},
    config::Config,
    release::ReleaseRecord,
    state::RunType,
};

pub(crate) mod document;
pub(crate) mod email;

/// The ways a release record can be delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Channel {
    Document,
    Email,
}

impl Channel {
    pub(crate) const NAMES: [&'static str; 2] = ["document", "email"];
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "email" => Ok(Self::Email),
            other => Err(format!("unknown channel {other}")),
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// One output for a [`ReleaseRecord`].
#[async_trait]
pub(crate) trait Renderer: Send + Sync {
    fn channel(&self) -> Channel;

    async fn deliver(&self, record: &ReleaseRecord, run_type: RunType) -> Result<(), Error>;
}

/// Set up a renderer per requested channel.
///
/// This only checks configuration and credentials, nothing is sent anywhere yet.
pub(crate) fn renderers(
    channels: &[Channel],
    config: &Config,
    credentials: &Credentials,
    client: &Client,
) -> Result<Vec<Box<dyn Renderer>>, app_config::Error> {
    let mut renderers: Vec<Box<dyn Renderer>> = Vec::with_capacity(channels.len());
    for channel in channels {
        match channel {
            Channel::Document => renderers.push(Box::new(DocumentPublisher::new(
                client.clone(),
                config.document.clone(),
                credentials.token_provider(client, &config.ims)?,
                credentials.aem_api_key()?.to_string(),
            ))),
            Channel::Email => {
                let email = config
                    .email
                    .clone()
                    .ok_or(app_config::Error::EmailNotConfigured)?;
                renderers.push(Box::new(EmailNotifier::new(
                    client.clone(),
                    email,
                    credentials.email_api_key()?.to_string(),
                )));
            }
        }
    }
    Ok(renderers)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] document::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Email(#[from] email::Error),
}
