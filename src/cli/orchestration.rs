//! Main workflow orchestration logic
//!
//! One cycle moves a tag through sync, rewrite, commit, push and pull request
//! creation. The stages run strictly in order and stop at the first failure;
//! nothing is retried and nothing is rolled back, so the local refs of a
//! cycle that failed to push stay in the workspace until the next sync.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::domain::{ChangeSet, CyclePhase, PullRequestRecord, RepositoryReference};
use crate::error::{ErrorClass, Result};
use crate::git::workspace::Workspace;
use crate::hosting::{PullRequestApi, TagSource};
use crate::publisher::{body_for, title_for, Publisher};
use crate::rewrite::ContentMutator;
use crate::watcher::TagWatcher;

/// Per-run settings that are not owned by one of the stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Repository the pull requests are opened on
    pub target: RepositoryReference,

    /// Stop after the local commit; push nothing and open no pull request
    pub dry_run: bool,
}

/// Result of a cycle that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published(PullRequestRecord),
    DryRun(ChangeSet),
    /// The monitored repository has no tag to apply
    NoTags,
}

/// Owns every stage of the pipeline for one monitored/target pair
pub struct Orchestrator<S, P, M> {
    watcher: TagWatcher<S>,
    workspace: Workspace,
    mutator: M,
    publisher: Publisher<P>,
    settings: RunSettings,
    phase: CyclePhase,
}

impl<S, P, M> Orchestrator<S, P, M>
where
    S: TagSource,
    P: PullRequestApi,
    M: ContentMutator,
{
    pub fn new(
        watcher: TagWatcher<S>,
        workspace: Workspace,
        mutator: M,
        publisher: Publisher<P>,
        settings: RunSettings,
    ) -> Self {
        Orchestrator {
            watcher,
            workspace,
            mutator,
            publisher,
            settings,
            phase: CyclePhase::Idle,
        }
    }

    /// Phase the last cycle reached. `Failed` after a cycle error.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn watcher(&self) -> &TagWatcher<S> {
        &self.watcher
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Apply `tag` to the target repository and open a pull request for it.
    ///
    /// Failures are logged here with the phase the cycle had reached and
    /// returned unchanged.
    pub async fn run_cycle(&mut self, tag: &str) -> Result<RunOutcome> {
        self.phase = CyclePhase::Idle;
        info!(tag, target = %self.settings.target, dry_run = self.settings.dry_run, "starting cycle");

        let result = self.advance(tag).await;
        if let Err(e) = &result {
            let reached = self.phase.name();
            if e.class() == ErrorClass::NoChanges {
                warn!(tag, phase = reached, "{}", e);
            } else {
                error!(tag, phase = reached, error = %e, "cycle failed");
            }
            self.phase = CyclePhase::Failed;
        }
        result
    }

    async fn advance(&mut self, tag: &str) -> Result<RunOutcome> {
        self.workspace.sync()?;
        self.phase = CyclePhase::Synced;

        let modified_paths = self.workspace.apply_change(tag, &self.mutator)?;
        self.phase = CyclePhase::Changed;

        let change_set = self.workspace.commit_change(tag, modified_paths)?;
        self.phase = CyclePhase::Committed;

        if self.settings.dry_run {
            info!(tag, branch = %change_set.branch_name, "dry run, leaving change local");
            self.phase = CyclePhase::Done;
            return Ok(RunOutcome::DryRun(change_set));
        }

        self.workspace.publish_branch(&change_set)?;
        self.phase = CyclePhase::Pushed;

        let base_branch = &self.workspace.options().base_branch;
        let record = self
            .publisher
            .create(
                &self.settings.target,
                &change_set.branch_name,
                base_branch,
                &title_for(tag),
                &body_for(tag),
            )
            .await?;
        self.phase = CyclePhase::Done;

        Ok(RunOutcome::Published(record))
    }

    /// Run a single cycle and return its outcome.
    ///
    /// Without `tag` the latest tag of the monitored repository is used. A
    /// failed tag listing is returned as an error, while a repository without
    /// tags yields [RunOutcome::NoTags].
    pub async fn run_once(&mut self, tag: Option<&str>) -> Result<RunOutcome> {
        let tag = match tag {
            Some(tag) => tag.to_string(),
            None => match self.watcher.fetch_latest().await? {
                Some(latest) => latest.name,
                None => {
                    info!(repository = %self.watcher.repository(), "no tags to apply");
                    return Ok(RunOutcome::NoTags);
                }
            },
        };

        self.run_cycle(&tag).await
    }

    /// Poll once and run a cycle when a new tag appeared.
    ///
    /// `None` when there was nothing to do.
    pub async fn tick(&mut self) -> Option<Result<RunOutcome>> {
        if !self.watcher.poll().await {
            return None;
        }

        let tag = self.watcher.current_tag_name().to_string();
        Some(self.run_cycle(&tag).await)
    }

    /// Watch for new tags forever.
    ///
    /// The known tag is recorded first so that an existing tag does not start
    /// a cycle. Ticks that fall due while a cycle runs are skipped.
    pub async fn run_poll_loop(&mut self, period: Duration) {
        self.watcher.initialize().await;

        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Some(Ok(RunOutcome::Published(record))) = self.tick().await {
                info!(pull_request = %record, "cycle done");
            }
        }
    }
}
