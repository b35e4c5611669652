use std::sync::{Arc, Mutex, MutexGuard};

use super::{PullRequestApi, PullRequestDraft, TagSource};
use crate::domain::{PullRequestRecord, RepositoryReference, TagState};
use crate::error::{Result, TagTrooperError};

/// Failure the mock answers pull request creation with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishFailure {
    Auth(String),
    Api(String),
}

#[derive(Debug, Default)]
struct MockState {
    tags: Vec<TagState>,
    tag_listing_failure: Option<String>,
    tag_listings: usize,
    publish_failure: Option<PublishFailure>,
    pull_requests: Vec<(RepositoryReference, PullRequestDraft)>,
}

/// In-memory hosting platform for tests without network access
///
/// Clones share state, so a test can keep one handle while the watcher and
/// publisher own others.
#[derive(Debug, Clone, Default)]
pub struct MockHosting {
    state: Arc<Mutex<MockState>>,
}

impl MockHosting {
    /// Create a new mock with no tags
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock answering tag listings with `tags`
    pub fn with_tags(tags: Vec<TagState>) -> Self {
        let mock = Self::new();
        mock.set_tags(tags);
        mock
    }

    /// Replace the tag listing
    pub fn set_tags(&self, tags: Vec<TagState>) {
        self.state().tags = tags;
    }

    /// Put a tag at the front of the listing
    pub fn push_tag(&self, tag: TagState) {
        self.state().tags.insert(0, tag);
    }

    /// Make tag listings fail with `message` (or succeed again with `None`)
    pub fn fail_tag_listing(&self, message: Option<&str>) {
        self.state().tag_listing_failure = message.map(str::to_string);
    }

    /// Make pull request creation fail (or succeed again with `None`)
    pub fn fail_publishing(&self, failure: Option<PublishFailure>) {
        self.state().publish_failure = failure;
    }

    /// Number of tag listings answered, failed ones included
    pub fn tag_listings(&self) -> usize {
        self.state().tag_listings
    }

    /// Pull requests opened so far, oldest first
    pub fn pull_requests(&self) -> Vec<(RepositoryReference, PullRequestDraft)> {
        self.state().pull_requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TagSource for MockHosting {
    async fn list_tags(&self, repository: &RepositoryReference) -> Result<Vec<TagState>> {
        let mut state = self.state();
        state.tag_listings += 1;
        match &state.tag_listing_failure {
            Some(message) => Err(TagTrooperError::tag_list(format!(
                "Cannot list tags of {}: {}",
                repository, message
            ))),
            None => Ok(state.tags.clone()),
        }
    }
}

impl PullRequestApi for MockHosting {
    async fn create_pull_request(
        &self,
        repository: &RepositoryReference,
        draft: &PullRequestDraft,
    ) -> Result<PullRequestRecord> {
        let mut state = self.state();
        match &state.publish_failure {
            Some(PublishFailure::Auth(message)) => Err(TagTrooperError::auth(message.clone())),
            Some(PublishFailure::Api(message)) => Err(TagTrooperError::api(message.clone())),
            None => {
                state
                    .pull_requests
                    .push((repository.clone(), draft.clone()));
                let number = state.pull_requests.len() as u64;
                Ok(PullRequestRecord {
                    number,
                    url: format!(
                        "https://github.com/{}/{}/pull/{}",
                        repository.owner, repository.name, number
                    ),
                })
            }
        }
    }
}
