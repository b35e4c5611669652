// tests/pipeline_test.rs
mod common;

use git2::Repository;

use common::{dockerfile_rewriter, file_at, Fixture};
use tagtrooper::cli::{Orchestrator, RunOutcome, RunSettings};
use tagtrooper::domain::{CyclePhase, RepositoryReference, TagState};
use tagtrooper::hosting::mock::PublishFailure;
use tagtrooper::hosting::MockHosting;
use tagtrooper::publisher::Publisher;
use tagtrooper::rewrite::PatternRewriter;
use tagtrooper::watcher::TagWatcher;
use tagtrooper::TagTrooperError;

type TestOrchestrator = Orchestrator<MockHosting, MockHosting, PatternRewriter>;

fn target() -> RepositoryReference {
    RepositoryReference::new("acme", "widgets")
}

async fn orchestrator(
    fixture: &Fixture,
    hosting: &MockHosting,
    dry_run: bool,
) -> TestOrchestrator {
    let mut watcher = TagWatcher::new(hosting.clone(), RepositoryReference::new("acme", "upstream"));
    watcher.initialize().await;

    Orchestrator::new(
        watcher,
        fixture.open_workspace(),
        dockerfile_rewriter(),
        Publisher::new(hosting.clone()),
        RunSettings {
            target: target(),
            dry_run,
        },
    )
}

#[tokio::test]
async fn test_run_once_publishes_pull_request() {
    let fixture = Fixture::new();
    let hosting = MockHosting::new();
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    let outcome = orchestrator.run_once(Some("1.4.0")).await.unwrap();

    let RunOutcome::Published(record) = outcome else {
        panic!("expected a pull request, got {:?}", outcome);
    };
    assert_eq!(record.number, 1);
    assert_eq!(orchestrator.phase(), CyclePhase::Done);

    let pull_requests = hosting.pull_requests();
    assert_eq!(pull_requests.len(), 1);
    let (repository, draft) = &pull_requests[0];
    assert_eq!(repository, &target());
    assert_eq!(draft.title, "Update to 1.4.0");
    assert_eq!(draft.head, "tt-1.4.0");
    assert_eq!(draft.base, "master");
    assert_eq!(draft.body, "Update to 1.4.0\n -- Your loyal tag trooper");

    let remote = fixture.remote();
    let branch = remote
        .find_reference("refs/heads/tt-1.4.0")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(branch.parent_ids().collect::<Vec<_>>(), vec![fixture.master]);
    assert_eq!(remote.refname_to_id("refs/tags/1.4.0").unwrap(), branch.id());
    assert!(file_at(&remote, "refs/heads/tt-1.4.0", "Dockerfile").contains("ARG VERSION=1.4.0\n"));
}

#[tokio::test]
async fn test_run_once_uses_latest_tag() {
    let fixture = Fixture::new();
    let hosting = MockHosting::with_tags(vec![
        TagState::new("1.5.0", "bbbbbbb"),
        TagState::new("1.4.0", "aaaaaaa"),
    ]);
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    let outcome = orchestrator.run_once(None).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Published(_)));
    assert_eq!(hosting.pull_requests()[0].1.head, "tt-1.5.0");
}

#[tokio::test]
async fn test_run_once_without_tags() {
    let fixture = Fixture::new();
    let hosting = MockHosting::new();
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    assert_eq!(orchestrator.run_once(None).await.unwrap(), RunOutcome::NoTags);
    assert!(hosting.pull_requests().is_empty());

    hosting.fail_tag_listing(Some("502 Bad Gateway"));
    let result = orchestrator.run_once(None).await;
    assert!(matches!(result, Err(TagTrooperError::TagList(_))));
}

#[tokio::test]
async fn test_dry_run_stops_after_commit() {
    let fixture = Fixture::new();
    let hosting = MockHosting::new();
    let mut orchestrator = orchestrator(&fixture, &hosting, true).await;

    let outcome = orchestrator.run_once(Some("1.4.0")).await.unwrap();

    let RunOutcome::DryRun(change_set) = outcome else {
        panic!("expected a dry run, got {:?}", outcome);
    };
    assert_eq!(change_set.branch_name, "tt-1.4.0");
    assert!(hosting.pull_requests().is_empty());
    assert!(fixture.remote().find_reference("refs/heads/tt-1.4.0").is_err());
}

#[tokio::test]
async fn test_already_applied_tag_is_no_change() {
    let fixture = Fixture::new();
    let hosting = MockHosting::new();
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    let result = orchestrator.run_once(Some("1.2.3")).await;

    assert!(matches!(result, Err(TagTrooperError::NoChanges(_))));
    assert_eq!(orchestrator.phase(), CyclePhase::Failed);
    assert!(hosting.pull_requests().is_empty());
}

#[tokio::test]
async fn test_publish_failure_leaves_pushed_branch() {
    let fixture = Fixture::new();
    let hosting = MockHosting::new();
    hosting.fail_publishing(Some(PublishFailure::Api(
        "A pull request already exists".to_string(),
    )));
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    let result = orchestrator.run_once(Some("1.4.0")).await;

    assert!(matches!(result, Err(TagTrooperError::Api(_))));
    assert!(fixture.remote().find_reference("refs/heads/tt-1.4.0").is_ok());
}

#[tokio::test]
async fn test_tick_runs_cycle_only_for_new_tag() {
    let fixture = Fixture::new();
    let hosting = MockHosting::with_tags(vec![TagState::new("1.2.3", "aaaaaaa")]);
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    assert!(orchestrator.tick().await.is_none());

    hosting.push_tag(TagState::new("1.4.0", "bbbbbbb"));
    let outcome = orchestrator.tick().await;
    assert!(matches!(outcome, Some(Ok(RunOutcome::Published(_)))));
    assert_eq!(orchestrator.watcher().current_tag_name(), "1.4.0");

    assert!(orchestrator.tick().await.is_none());
    assert_eq!(hosting.pull_requests().len(), 1);
}

#[tokio::test]
async fn test_push_failure_does_not_stop_polling() {
    let fixture = Fixture::new();
    let taken = fixture.add_unrelated_branch("tt-1.4.0");
    let hosting = MockHosting::with_tags(vec![TagState::new("1.2.3", "aaaaaaa")]);
    let mut orchestrator = orchestrator(&fixture, &hosting, false).await;

    hosting.push_tag(TagState::new("1.4.0", "bbbbbbb"));
    let outcome = orchestrator.tick().await;

    assert!(matches!(outcome, Some(Err(TagTrooperError::Push(_)))));
    assert_eq!(orchestrator.phase(), CyclePhase::Failed);
    assert!(hosting.pull_requests().is_empty());
    assert_eq!(
        fixture.remote().refname_to_id("refs/heads/tt-1.4.0").unwrap(),
        taken
    );

    let clone = Repository::open(orchestrator.workspace().path()).unwrap();
    assert_ne!(clone.refname_to_id("refs/heads/tt-1.4.0").unwrap(), taken);

    assert!(orchestrator.tick().await.is_none());

    hosting.push_tag(TagState::new("1.5.0", "ccccccc"));
    let outcome = orchestrator.tick().await;
    assert!(matches!(outcome, Some(Ok(RunOutcome::Published(_)))));
    assert_eq!(hosting.pull_requests()[0].1.head, "tt-1.5.0");
}
