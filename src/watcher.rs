//! Tag change detection for the monitored repository.

use tracing::{debug, info, warn};

use crate::domain::{RepositoryReference, TagState};
use crate::error::Result;
use crate::hosting::TagSource;

/// Remembers the last tag seen on the monitored repository and reports when
/// a different one shows up.
///
/// The first entry of the platform's tag listing is taken as the latest tag.
/// That ordering is an assumption about the platform, not something the
/// watcher checks.
pub struct TagWatcher<S> {
    source: S,
    repository: RepositoryReference,
    last_tag: Option<TagState>,
}

impl<S: TagSource> TagWatcher<S> {
    pub fn new(source: S, repository: RepositoryReference) -> Self {
        TagWatcher {
            source,
            repository,
            last_tag: None,
        }
    }

    /// Record the current latest tag without reporting it as new.
    ///
    /// A failed listing leaves the watcher without a known tag; the next
    /// successful poll then reports whatever tag it finds.
    pub async fn initialize(&mut self) {
        match self.fetch_latest().await {
            Ok(Some(tag)) => {
                info!(repository = %self.repository, tag = %tag.name, sha = %tag.short_sha(), "last known tag")
            }
            Ok(None) => info!(repository = %self.repository, "no tag yet"),
            Err(e) => warn!(repository = %self.repository, error = %e, "tag listing failed"),
        }
    }

    /// List tags and store the first one as the known tag, without logging.
    ///
    /// Unlike [TagWatcher::initialize] a failed listing is returned to the
    /// caller. An empty listing clears the known tag.
    pub async fn fetch_latest(&mut self) -> Result<Option<TagState>> {
        let tags = self.source.list_tags(&self.repository).await?;
        self.last_tag = tags.into_iter().next();
        Ok(self.last_tag.clone())
    }

    /// Check for a new tag. Returns true when the latest tag's commit differs
    /// from the one seen before, in which case it becomes the known tag.
    pub async fn poll(&mut self) -> bool {
        let current = match self.latest().await {
            Listing::Latest(tag) => tag,
            Listing::Failed => return false,
            Listing::Empty => {
                debug!(repository = %self.repository, "no tags yet");
                return false;
            }
        };

        let changed = self
            .last_tag
            .as_ref()
            .map_or(true, |last| last.commit_sha != current.commit_sha);

        if changed {
            info!(repository = %self.repository, tag = %current.name, sha = %current.short_sha(), "new tag");
            self.last_tag = Some(current);
        } else {
            debug!(repository = %self.repository, "no new tag");
        }

        changed
    }

    /// Name of the known tag, or an empty string when none is known
    pub fn current_tag_name(&self) -> &str {
        self.last_tag.as_ref().map_or("", |tag| tag.name.as_str())
    }

    pub fn last_tag(&self) -> Option<&TagState> {
        self.last_tag.as_ref()
    }

    pub fn repository(&self) -> &RepositoryReference {
        &self.repository
    }

    async fn latest(&self) -> Listing {
        match self.source.list_tags(&self.repository).await {
            Ok(tags) => tags
                .into_iter()
                .next()
                .map_or(Listing::Empty, Listing::Latest),
            Err(e) => {
                warn!(repository = %self.repository, error = %e, "tag listing failed");
                Listing::Failed
            }
        }
    }
}

/// Outcome of one tag listing. Failures are logged where they happen.
enum Listing {
    Latest(TagState),
    Empty,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::MockHosting;

    fn watcher(mock: &MockHosting) -> TagWatcher<MockHosting> {
        TagWatcher::new(mock.clone(), RepositoryReference::new("acme", "upstream"))
    }

    #[tokio::test]
    async fn test_initialize_takes_first_entry() {
        let mock = MockHosting::with_tags(vec![TagState::new("v2", "b"), TagState::new("v1", "a")]);
        let mut watcher = watcher(&mock);

        watcher.initialize().await;

        assert_eq!(watcher.last_tag(), Some(&TagState::new("v2", "b")));
        assert_eq!(watcher.current_tag_name(), "v2");
    }

    #[tokio::test]
    async fn test_poll_with_identical_listing_reports_nothing() {
        let mock = MockHosting::with_tags(vec![TagState::new("v2", "b"), TagState::new("v1", "a")]);
        let mut watcher = watcher(&mock);
        watcher.initialize().await;

        assert!(!watcher.poll().await);
        assert_eq!(watcher.current_tag_name(), "v2");
    }

    #[tokio::test]
    async fn test_poll_detects_new_tag() {
        let mock = MockHosting::with_tags(vec![TagState::new("v2", "b"), TagState::new("v1", "a")]);
        let mut watcher = watcher(&mock);
        watcher.initialize().await;

        mock.push_tag(TagState::new("v3", "c"));

        assert!(watcher.poll().await);
        assert_eq!(watcher.last_tag(), Some(&TagState::new("v3", "c")));
        assert!(!watcher.poll().await);
    }

    #[tokio::test]
    async fn test_retag_of_same_commit_is_not_new() {
        let mock = MockHosting::with_tags(vec![TagState::new("v2", "b")]);
        let mut watcher = watcher(&mock);
        watcher.initialize().await;

        mock.push_tag(TagState::new("v2-final", "b"));

        assert!(!watcher.poll().await);
        assert_eq!(watcher.current_tag_name(), "v2");
    }

    #[tokio::test]
    async fn test_fetch_latest_propagates_failure() {
        let mock = MockHosting::new();
        mock.fail_tag_listing(Some("timeout"));
        let mut watcher = watcher(&mock);

        assert!(watcher.fetch_latest().await.is_err());

        mock.fail_tag_listing(None);
        assert_eq!(watcher.fetch_latest().await.unwrap(), None);

        mock.push_tag(TagState::new("v1", "a"));
        assert_eq!(
            watcher.fetch_latest().await.unwrap(),
            Some(TagState::new("v1", "a"))
        );
    }

    #[tokio::test]
    async fn test_failed_initialize_leaves_tag_unset() {
        let mock = MockHosting::with_tags(vec![TagState::new("v2", "b")]);
        mock.fail_tag_listing(Some("rate limited"));
        let mut watcher = watcher(&mock);

        watcher.initialize().await;

        assert!(watcher.last_tag().is_none());
        assert_eq!(watcher.current_tag_name(), "");
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_last_tag() {
        let mock = MockHosting::with_tags(vec![TagState::new("v2", "b")]);
        let mut watcher = watcher(&mock);
        watcher.initialize().await;

        mock.push_tag(TagState::new("v3", "c"));
        mock.fail_tag_listing(Some("502 Bad Gateway"));

        assert!(!watcher.poll().await);
        assert_eq!(watcher.current_tag_name(), "v2");

        mock.fail_tag_listing(None);
        assert!(watcher.poll().await);
        assert_eq!(watcher.current_tag_name(), "v3");
    }

    #[tokio::test]
    async fn test_first_tag_after_empty_repository_is_new() {
        let mock = MockHosting::new();
        let mut watcher = watcher(&mock);
        watcher.initialize().await;
        assert!(!watcher.poll().await);

        mock.push_tag(TagState::new("v1", "a"));

        assert!(watcher.poll().await);
        assert_eq!(watcher.current_tag_name(), "v1");
    }
}
