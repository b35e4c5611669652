//! Hosting platform API abstraction
//!
//! The watcher only needs to list tags and the publisher only needs to open
//! pull requests, so each concern gets its own trait:
//!
//! - [TagSource]: ordered tag listing for a repository
//! - [PullRequestApi]: pull request creation
//!
//! [github::GitHubClient] implements both against the GitHub REST API and
//! [mock::MockHosting] implements both in memory for tests.

pub mod github;
pub mod mock;

pub use github::GitHubClient;
pub use mock::MockHosting;

use std::future::Future;

use crate::domain::{PullRequestRecord, RepositoryReference, TagState};
use crate::error::Result;

/// Pull request to be opened on the target repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    /// Branch holding the change, e.g. `tt-1.4.0`
    pub head: String,
    /// Branch the change should merge into, e.g. `master`
    pub base: String,
    pub body: String,
}

/// Lists the tags of a repository
pub trait TagSource {
    /// Tags in the order the platform returns them.
    ///
    /// Callers treat the first entry as the latest tag. GitHub does not
    /// document the order of this listing, so that assumption is unverified.
    fn list_tags(
        &self,
        repository: &RepositoryReference,
    ) -> impl Future<Output = Result<Vec<TagState>>> + Send;
}

/// Opens pull requests
pub trait PullRequestApi {
    /// Opens `draft` on `repository`. A single attempt; never retried.
    fn create_pull_request(
        &self,
        repository: &RepositoryReference,
        draft: &PullRequestDraft,
    ) -> impl Future<Output = Result<PullRequestRecord>> + Send;
}
