use log::debug;
use miette::Diagnostic;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, StatusCode,
};

/// Store `document` as `{path}.html` in the DA content source.
pub(crate) async fn upload_document(
    client: &Client,
    source_url: &str,
    path: &str,
    document: String,
    token: &str,
) -> Result<StatusCode, Error> {
    let url = format!("{}{path}.html", source_url.trim_end_matches('/'));
    let file_name = format!("{}.html", path.rsplit('/').next().unwrap_or("index"));
    let part = Part::text(document)
        .file_name(file_name)
        .mime_str("text/html")
        .map_err(|source| Error::ApiRequest {
            err: source.to_string(),
            url: url.clone(),
        })?;

    debug!("Uploading document to {url}");
    let response = client
        .post(&url)
        .bearer_auth(token)
        .multipart(Form::new().part("data", part))
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|source| Error::ApiRequest {
            err: source.to_string(),
            url,
        })?;
    Ok(response.status())
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Trouble uploading the release notes document to {url}: {err}")]
    #[diagnostic(
        code(da::api_request_error),
        help("The document source rejected the upload, check that the IMS token may write to this path.")
    )]
    ApiRequest { err: String, url: String },
}
