use std::env::var;

use miette::Diagnostic;
use reqwest::Client;

use crate::{
    config,
    integrations::ims::{Ims, StaticToken, TokenProvider},
};

pub(crate) const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub(crate) const IMS_CLIENT_ID: &str = "IMS_CLIENT_ID";
pub(crate) const IMS_CLIENT_SECRET: &str = "IMS_CLIENT_SECRET";
pub(crate) const DA_TOKEN: &str = "DA_TOKEN";
pub(crate) const AEM_API_KEY: &str = "AEM_API_KEY";
pub(crate) const EMAIL_API_KEY: &str = "EMAIL_API_KEY";

/// Secrets, which only ever come from the environment.
#[derive(Clone, Default)]
pub(crate) struct Credentials {
    pub(crate) github_token: Option<String>,
    ims_client_id: Option<String>,
    ims_client_secret: Option<String>,
    da_token: Option<String>,
    aem_api_key: Option<String>,
    email_api_key: Option<String>,
}

impl Credentials {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| var(key).ok())
    }

    /// Empty values count as missing.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            github_token: get(GITHUB_TOKEN),
            ims_client_id: get(IMS_CLIENT_ID),
            ims_client_secret: get(IMS_CLIENT_SECRET),
            da_token: get(DA_TOKEN),
            aem_api_key: get(AEM_API_KEY),
            email_api_key: get(EMAIL_API_KEY),
        }
    }

    pub(crate) fn aem_api_key(&self) -> Result<&str, Error> {
        require(self.aem_api_key.as_deref(), AEM_API_KEY)
    }

    pub(crate) fn email_api_key(&self) -> Result<&str, Error> {
        require(self.email_api_key.as_deref(), EMAIL_API_KEY)
    }

    /// A pre-issued `DA_TOKEN` wins over exchanging the IMS client credentials.
    pub(crate) fn token_provider(
        &self,
        client: &Client,
        ims: &config::Ims,
    ) -> Result<Box<dyn TokenProvider>, Error> {
        if let Some(token) = &self.da_token {
            return Ok(Box::new(StaticToken(token.clone())));
        }
        let client_id = require(self.ims_client_id.as_deref(), IMS_CLIENT_ID)?;
        let client_secret = require(self.ims_client_secret.as_deref(), IMS_CLIENT_SECRET)?;
        Ok(Box::new(Ims::new(
            client.clone(),
            ims,
            client_id.to_string(),
            client_secret.to_string(),
        )))
    }
}

fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, Error> {
    value.ok_or(Error::MissingCredential { name })
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("No {name} was found in the environment")]
    #[diagnostic(
        code(app_config::missing_credential),
        help("Set the {name} environment variable before running docket.")
    )]
    MissingCredential { name: &'static str },
    #[error("The email channel needs an [email] table in docket.toml")]
    #[diagnostic(
        code(app_config::email_not_configured),
        help("Add template_id, from, and to under [email].")
    )]
    EmailNotConfigured,
}

#[cfg(test)]
mod test_credentials {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn credentials(pairs: &[(&str, &str)]) -> Credentials {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Credentials::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_values_are_missing() {
        let credentials = credentials(&[(AEM_API_KEY, ""), (GITHUB_TOKEN, "gh")]);

        assert!(matches!(
            credentials.aem_api_key(),
            Err(Error::MissingCredential { name: AEM_API_KEY })
        ));
        assert_eq!(credentials.github_token.as_deref(), Some("gh"));
    }

    #[test]
    fn ims_needs_both_halves() {
        let credentials = credentials(&[(IMS_CLIENT_ID, "id")]);

        let result = credentials.token_provider(&Client::new(), &config::Ims::default());

        assert!(matches!(
            result,
            Err(Error::MissingCredential {
                name: IMS_CLIENT_SECRET
            })
        ));
    }

    #[tokio::test]
    async fn da_token_skips_ims() {
        let credentials = credentials(&[(DA_TOKEN, "pre-issued")]);

        let provider = credentials
            .token_provider(&Client::new(), &config::Ims::default())
            .unwrap();

        assert_eq!(provider.bearer_token().await.unwrap(), "pre-issued");
    }
}
