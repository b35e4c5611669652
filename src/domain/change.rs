use git2::Oid;
use std::fmt;
use std::path::PathBuf;

use super::tag::{branch_ref_for, tag_ref_for};

/// The local result of one cycle: a commit plus the refs pointing at it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub branch_name: String,
    pub tag_name: String,
    /// Paths relative to the workspace root, in the order they were modified
    pub modified_paths: Vec<PathBuf>,
    pub commit_id: Oid,
}

impl ChangeSet {
    pub fn branch_ref(&self) -> String {
        branch_ref_for(&self.tag_name)
    }

    pub fn tag_ref(&self) -> String {
        tag_ref_for(&self.tag_name)
    }

    /// Refspecs pushing the branch and the tag under the same names remotely
    pub fn push_refspecs(&self) -> Vec<String> {
        [self.branch_ref(), self.tag_ref()]
            .into_iter()
            .map(|name| format!("{}:{}", name, name))
            .collect()
    }
}

/// A pull request opened on the target repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub number: u64,
    pub url: String,
}

impl fmt::Display for PullRequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.number, self.url)
    }
}

/// Where a cycle got to before it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Synced,
    Changed,
    Committed,
    Pushed,
    Done,
    Failed,
}

impl CyclePhase {
    pub fn name(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Synced => "synced",
            CyclePhase::Changed => "changed",
            CyclePhase::Committed => "committed",
            CyclePhase::Pushed => "pushed",
            CyclePhase::Done => "done",
            CyclePhase::Failed => "failed",
        }
    }
}
