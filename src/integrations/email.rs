use log::debug;
use miette::Diagnostic;
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// A templated message in the SendGrid v3 `mail/send` shape.
#[derive(Debug, Serialize)]
pub(crate) struct Message<'a, T> {
    from: Address<'a>,
    personalizations: [Personalization<'a, T>; 1],
    template_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a, T> {
    to: Vec<Address<'a>>,
    dynamic_template_data: T,
}

impl<'a, T: Serialize> Message<'a, T> {
    pub(crate) fn new(from: &'a str, to: &'a [String], template_id: &'a str, data: T) -> Self {
        Self {
            from: Address { email: from },
            personalizations: [Personalization {
                to: to.iter().map(|email| Address { email }).collect(),
                dynamic_template_data: data,
            }],
            template_id,
        }
    }
}

/// Hand `message` to the mail API, returning the delivery status it answered with.
pub(crate) async fn send<T: Serialize + Sync>(
    client: &Client,
    endpoint: &str,
    api_key: &str,
    message: &Message<'_, T>,
) -> Result<StatusCode, Error> {
    debug!("Sending email through {endpoint}");
    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(message)
        .send()
        .await
        .map_err(|source| Error::ApiRequest {
            err: source.to_string(),
        })?;
    let status = response.status();
    if status.is_success() {
        return Ok(status);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Rejected { status, body })
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Trouble communicating with the mail API: {err}")]
    #[diagnostic(
        code(email::api_request_error),
        help("There was a problem reaching the mail API, this may be a network issue.")
    )]
    ApiRequest { err: String },
    #[error("The mail API refused the message with {status}: {body}")]
    #[diagnostic(
        code(email::rejected),
        help("Check EMAIL_API_KEY and the template_id and addresses in the [email] config.")
    )]
    Rejected { status: StatusCode, body: String },
}
