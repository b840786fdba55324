use async_trait::async_trait;
use serde::Deserialize;

use super::{Error, GitHub, UserDirectory};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) login: String,
    /// The profile's display name, often unset.
    pub(crate) name: Option<String>,
}

#[async_trait]
impl UserDirectory for GitHub {
    async fn user(&self, login: &str) -> Result<User, Error> {
        let request = self.get(&format!("/users/{login}"));
        self.fetch(request, format!("looking up user {login}")).await
    }
}
