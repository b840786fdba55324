use log::{info, warn};
use miette::Diagnostic;

use crate::{
    release::{self, PullRequestRef, RecordBuilder},
    render::{self, Renderer},
    state::RunType,
};

/// What happened to one pull request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Published,
    /// Nobody merged it, so there was nothing to release.
    NoApprovals,
}

/// Build the record for `pr` and hand it to every renderer, in order.
///
/// The first renderer failure stops the rest.
pub(crate) async fn publish(
    builder: &RecordBuilder<'_>,
    renderers: &[Box<dyn Renderer>],
    pr: &PullRequestRef,
    run_type: RunType,
) -> Result<Outcome, Error> {
    info!("Processing {pr}");
    let Some(record) = builder.build(pr).await? else {
        info!("No approvals.");
        return Ok(Outcome::NoApprovals);
    };
    for renderer in renderers {
        info!("Delivering {pr} via {}", renderer.channel());
        renderer.deliver(&record, run_type).await?;
    }
    Ok(Outcome::Published)
}

/// Publish every pull request in `prs`, one after the other.
///
/// A failure is logged and the batch moves on; all failures are reported together at the end.
pub(crate) async fn backfill(
    builder: &RecordBuilder<'_>,
    renderers: &[Box<dyn Renderer>],
    prs: &[PullRequestRef],
    run_type: RunType,
) -> Result<(), BackfillErrorCollection> {
    let mut errors = Vec::new();
    let mut published = 0;
    for pr in prs {
        match publish(builder, renderers, pr, run_type).await {
            Ok(Outcome::Published) => published += 1,
            Ok(Outcome::NoApprovals) => {}
            Err(err) => {
                warn!("Failed to publish {pr}: {err}");
                errors.push(PullRequestError {
                    pr: pr.to_string(),
                    inner: Box::new([err]),
                });
            }
        }
    }
    info!("Published {published} of {} pull requests", prs.len());
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BackfillErrorCollection { errors })
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Release(#[from] release::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] render::Error),
}

/// Every pull request that failed during a backfill.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{} pull requests could not be published", errors.len())]
pub(crate) struct BackfillErrorCollection {
    #[related]
    errors: Vec<PullRequestError>,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Problem publishing {pr}")]
pub(crate) struct PullRequestError {
    pr: String,
    #[related]
    inner: Box<[Error; 1]>,
}

#[cfg(test)]
mod test_workflow {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config,
        integrations::github::{
            fake::{pull_request, review, FakeGitHub},
            ReviewState,
        },
        release::ReleaseRecord,
        render::Channel,
    };

    type Deliveries = Arc<Mutex<Vec<(Channel, u64, RunType)>>>;

    /// Remembers every delivery instead of sending anything.
    struct Recorder {
        channel: Channel,
        delivered: Deliveries,
    }

    #[async_trait]
    impl Renderer for Recorder {
        fn channel(&self) -> Channel {
            self.channel
        }

        async fn deliver(
            &self,
            record: &ReleaseRecord,
            run_type: RunType,
        ) -> Result<(), render::Error> {
            self.delivered
                .lock()
                .unwrap()
                .push((self.channel, record.number, run_type));
            Ok(())
        }
    }

    fn recorders() -> (Vec<Box<dyn Renderer>>, Deliveries) {
        let delivered = Deliveries::default();
        let renderers: Vec<Box<dyn Renderer>> = [Channel::Document, Channel::Email]
            .into_iter()
            .map(|channel| {
                Box::new(Recorder {
                    channel,
                    delivered: delivered.clone(),
                }) as Box<dyn Renderer>
            })
            .collect();
        (renderers, delivered)
    }

    fn approved() -> FakeGitHub {
        FakeGitHub {
            pull_request: Some(pull_request(Some("## Release notes\nShiny"))),
            reviews: vec![review("reviewer", ReviewState::Approved)],
            ..FakeGitHub::default()
        }
        .with_user("merger", None)
        .with_user("reviewer", None)
        .with_user("author", None)
    }

    fn pr() -> PullRequestRef {
        PullRequestRef::new("adobe", "da-live", 71)
    }

    #[tokio::test]
    async fn approved_pull_request_reaches_every_renderer() {
        let github = approved();
        let notes = config::Notes::default();
        let builder = RecordBuilder::new(&github, &github, &notes);
        let (renderers, delivered) = recorders();

        let outcome = publish(&builder, &renderers, &pr(), RunType::DryRun)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Published);
        assert_eq!(
            *delivered.lock().unwrap(),
            vec![
                (Channel::Document, 71, RunType::DryRun),
                (Channel::Email, 71, RunType::DryRun),
            ]
        );
    }

    #[tokio::test]
    async fn unmerged_pull_request_renders_nothing() {
        let mut github = approved();
        if let Some(pull) = github.pull_request.as_mut() {
            pull.merged_by = None;
            pull.merged_at = None;
        }
        let notes = config::Notes::default();
        let builder = RecordBuilder::new(&github, &github, &notes);
        let (renderers, delivered) = recorders();

        let outcome = publish(&builder, &renderers, &pr(), RunType::Real)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::NoApprovals);
        assert!(delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backfill_reports_every_failure() {
        let github = approved();
        let notes = config::Notes::default();
        let builder = RecordBuilder::new(&github, &github, &notes);
        let (renderers, delivered) = recorders();
        let prs = [
            PullRequestRef::new("adobe", "missing", 1),
            pr(),
            PullRequestRef::new("adobe", "missing", 2),
        ];

        let err = backfill(&builder, &renderers, &prs, RunType::Real)
            .await
            .unwrap_err();

        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.errors[0].pr, "adobe/missing#1");
        assert_eq!(err.errors[1].pr, "adobe/missing#2");
        assert_eq!(err.to_string(), "2 pull requests could not be published");
        assert_eq!(delivered.lock().unwrap().len(), 2);
        assert_eq!(github.calls().pull_requests, 3);
    }

    #[tokio::test]
    async fn clean_backfill_is_ok() {
        let github = approved();
        let notes = config::Notes::default();
        let builder = RecordBuilder::new(&github, &github, &notes);
        let (renderers, delivered) = recorders();

        backfill(&builder, &renderers, &[pr(), pr()], RunType::Real)
            .await
            .unwrap();

        assert_eq!(delivered.lock().unwrap().len(), 4);
    }
}
