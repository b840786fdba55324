use crate::integrations::github::{self, UserDirectory};

/// The name to show for `login`: the profile name when one is set, the login otherwise.
pub(crate) async fn resolve_display_name(
    users: &dyn UserDirectory,
    login: &str,
) -> Result<String, github::Error> {
    let user = users.user(login).await?;
    Ok(user
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or(user.login))
}
