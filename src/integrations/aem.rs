use std::fmt::{self, Display};

use log::info;
use miette::Diagnostic;
use reqwest::{Client, StatusCode};

/// The AEM admin operations docket uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Preview,
    Live,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preview => write!(f, "preview"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// Where and how to reach the AEM admin API.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Admin<'a> {
    pub(crate) client: &'a Client,
    pub(crate) admin_url: &'a str,
    /// The branch of the site, usually `main`.
    pub(crate) reference: &'a str,
    pub(crate) api_key: &'a str,
}

impl Admin<'_> {
    /// Preview `path`, then publish it live. Nothing goes live if the preview fails.
    pub(crate) async fn publish(&self, path: &str) -> Result<(), Error> {
        self.run(Operation::Preview, path).await?;
        self.run(Operation::Live, path).await
    }

    async fn run(&self, operation: Operation, path: &str) -> Result<(), Error> {
        let url = self.url(operation, path)?;
        let response = self
            .client
            .post(&url)
            .header("X-Auth-Token", self.api_key)
            .send()
            .await
            .map_err(|source| Error::ApiRequest {
                operation,
                err: source.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Rejected { operation, status });
        }
        info!("Success on AEM {operation} of {path}");
        Ok(())
    }

    /// `path` is `/{org}/{site}/{rest}`, the admin API wants the branch between site and rest.
    fn url(&self, operation: Operation, path: &str) -> Result<String, Error> {
        let mut segments = path.trim_start_matches('/').splitn(3, '/');
        let (Some(org), Some(site), Some(rest)) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(Error::InvalidPath {
                path: path.to_string(),
            });
        };
        Ok(format!(
            "{}/{operation}/{org}/{site}/{}/{rest}",
            self.admin_url.trim_end_matches('/'),
            self.reference
        ))
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Trouble communicating with AEM during {operation}: {err}")]
    #[diagnostic(
        code(aem::api_request_error),
        help("There was a problem reaching the AEM admin API, this may be a network issue.")
    )]
    ApiRequest { operation: Operation, err: String },
    #[error("Error on AEM {operation}: {status}")]
    #[diagnostic(
        code(aem::rejected),
        help("Check that AEM_API_KEY is valid for this site.")
    )]
    Rejected {
        operation: Operation,
        status: StatusCode,
    },
    #[error("{path} is not a publishable path")]
    #[diagnostic(
        code(aem::invalid_path),
        help("Document paths need at least an org, a site and a page, like /org/site/page.")
    )]
    InvalidPath { path: String },
}
