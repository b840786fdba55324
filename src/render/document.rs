use async_trait::async_trait;
use log::info;
use miette::Diagnostic;
use reqwest::Client;

use super::{Channel, Renderer};
use crate::{
    config,
    integrations::{
        aem::{self, Admin},
        da,
        ims::{self, TokenProvider},
    },
    release::ReleaseRecord,
    state::RunType,
};

/// The release notes page: a `release-notes` block for readers and a `metadata` block for the
/// site's index.
pub(crate) fn format_document(record: &ReleaseRecord) -> String {
    let ReleaseRecord {
        title,
        repo,
        date,
        content,
        approvers,
        created_by,
        released_by,
        files,
        url,
        ..
    } = record;
    let timestamp = record.timestamp();
    format!(
        r#"<body>
  <main>
    <div>
      <div class="release-notes">
        <div>
          <div>
            <h1><a href="{url}">{title}</a></h1>
            <p><strong>Released</strong> {date}</p>
          </div>
        </div>
        <div>
          <div>
            <h2>Notes</h2>
            {content}
          </div>
        </div>
        <div>
          <div>
            <h2>Created by</h2>
            <p>{created_by}</p>
          </div>
          <div>
            <h2>Scope</h2>
            <p>{files}</p>
          </div>
        </div>
        <div>
          <div>
            <h2>Approved by</h2>
            <p>{approvers}</p>
          </div>
          <div>
            <h2>Released by</h2>
            <p>{released_by}</p>
          </div>
        </div>
      </div>
      <div class="metadata">
        <div>
          <div>Title</div>
          <div>{date}</div>
        </div>
        <div>
          <div>Description</div>
          <div>{title}</div>
        </div>
        <div>
          <div>Repo</div>
          <div>{repo}</div>
        </div>
        <div>
          <div>Timestamp</div>
          <div>{timestamp}</div>
        </div>
      </div>
    </div>
  </main>
</body>
"#
    )
}

/// Uploads the release notes page to DA, then previews and publishes it with AEM.
pub(crate) struct DocumentPublisher {
    client: Client,
    config: config::Document,
    tokens: Box<dyn TokenProvider>,
    aem_api_key: String,
}

impl DocumentPublisher {
    pub(crate) fn new(
        client: Client,
        config: config::Document,
        tokens: Box<dyn TokenProvider>,
        aem_api_key: String,
    ) -> Self {
        Self {
            client,
            config,
            tokens,
            aem_api_key,
        }
    }
}

#[async_trait]
impl Renderer for DocumentPublisher {
    fn channel(&self) -> Channel {
        Channel::Document
    }

    async fn deliver(&self, record: &ReleaseRecord, run_type: RunType) -> Result<(), super::Error> {
        let path = self.config.path(&record.repo, record.number);
        let document = format_document(record);
        if run_type == RunType::DryRun {
            info!(
                "Would upload {} bytes to {}{path}.html, then preview and publish it",
                document.len(),
                self.config.source_url
            );
            return Ok(());
        }

        let token = self.tokens.bearer_token().await.map_err(Error::from)?;
        let status = da::upload_document(
            &self.client,
            &self.config.source_url,
            &path,
            document,
            &token,
        )
        .await
        .map_err(Error::from)?;
        info!("Uploaded {path} ({status})");

        Admin {
            client: &self.client,
            admin_url: &self.config.admin_url,
            reference: &self.config.reference,
            api_key: &self.aem_api_key,
        }
        .publish(&path)
        .await
        .map_err(Error::from)?;
        Ok(())
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Token(#[from] ims::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] da::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Publish(#[from] aem::Error),
}

#[cfg(test)]
mod test_document {
    use pretty_assertions::assert_eq;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::integrations::ims::StaticToken;

    const PAGE: &str = "/da-pilot/docket/about/release-notes/da-live/71";

    fn publisher(server: &MockServer) -> DocumentPublisher {
        DocumentPublisher::new(
            Client::new(),
            config::Document {
                source_url: format!("{}/source", server.uri()),
                admin_url: server.uri(),
                ..config::Document::default()
            },
            Box::new(StaticToken("token".to_string())),
            "key".to_string(),
        )
    }

    #[test]
    fn fills_every_field() {
        let document = format_document(&ReleaseRecord::sample());

        assert!(document.contains(
            r#"<h1><a href="https://github.com/adobe/da-live/pull/71">Fix & polish</a></h1>"#
        ));
        assert!(document.contains("<p><strong>Released</strong> Jan 5, 2025 - 09:03</p>"));
        assert!(document.contains("<li>Fixed the thing</li>"));
        assert!(document.contains("<p>The Author</p>"));
        assert!(document.contains("<p>3 files</p>"));
        assert!(document.contains("<p>First Reviewer<br/>second</p>"));
        assert!(document.contains("<p>Merge Person</p>"));
        assert!(document.contains("<div>da-live</div>"));
        assert!(document.contains("<div>1736067780</div>"));
        assert_eq!(document.matches("Jan 5, 2025 - 09:03").count(), 2);
    }

    #[tokio::test]
    async fn uploads_then_publishes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/source{PAGE}.html")))
            .and(header("Authorization", "Bearer token"))
            .and(body_string_contains("<h2>Notes</h2>"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        for operation in ["preview", "live"] {
            Mock::given(method("POST"))
                .and(path(format!(
                    "/{operation}/da-pilot/docket/main/about/release-notes/da-live/71"
                )))
                .and(header("X-Auth-Token", "key"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }

        publisher(&server)
            .deliver(&ReleaseRecord::sample(), RunType::Real)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_upload_skips_publishing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/source{PAGE}.html")))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let result = publisher(&server)
            .deliver(&ReleaseRecord::sample(), RunType::Real)
            .await;

        assert!(matches!(
            result,
            Err(super::super::Error::Document(Error::Upload(_)))
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let server = MockServer::start().await;

        publisher(&server)
            .deliver(&ReleaseRecord::sample(), RunType::DryRun)
            .await
            .unwrap();

        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
