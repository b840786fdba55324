use async_trait::async_trait;
use log::debug;
use miette::Diagnostic;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::config;

/// Something that can hand out a bearer token for the document source.
#[async_trait]
pub(crate) trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, Error>;
}

/// A token that was obtained ahead of time.
#[derive(Clone, Debug)]
pub(crate) struct StaticToken(pub(crate) String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

/// Exchanges client credentials with Adobe IMS for a fresh access token on every call.
#[derive(Clone, Debug)]
pub(crate) struct Ims {
    client: Client,
    endpoint: String,
    scopes: String,
    client_id: String,
    client_secret: String,
}

impl Ims {
    pub(crate) fn new(
        client: Client,
        config: &config::Ims,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            scopes: config.scopes.clone(),
            client_id,
            client_secret,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
impl TokenProvider for Ims {
    async fn bearer_token(&self) -> Result<String, Error> {
        debug!("Requesting an IMS token from {}", self.endpoint);
        let response: TokenResponse = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scopes.as_str()),
            ])
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| Error::ApiRequest {
                err: source.to_string(),
            })?
            .json()
            .await
            .map_err(Error::ApiResponse)?;
        Ok(response.access_token)
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Could not get an IMS token: {err}")]
    #[diagnostic(
        code(ims::api_request_error),
        help("Check IMS_CLIENT_ID and IMS_CLIENT_SECRET, and that the IMS endpoint is reachable.")
    )]
    ApiRequest { err: String },
    #[error("The IMS token response could not be decoded: {0}")]
    #[diagnostic(
        code(ims::api_response_error),
        help("IMS answered without an `access_token`, check the configured endpoint.")
    )]
    ApiResponse(#[source] reqwest::Error),
}
