//! Pull request creation for pushed change sets.

use tracing::info;

use crate::domain::{PullRequestRecord, RepositoryReference};
use crate::error::Result;
use crate::hosting::{PullRequestApi, PullRequestDraft};

/// Signature appended to every pull request body
pub const BODY_SIGNATURE: &str = " -- Your loyal tag trooper";

/// Pull request title for `tag`
pub fn title_for(tag: &str) -> String {
    format!("Update to {}", tag)
}

/// Pull request body for `tag`
pub fn body_for(tag: &str) -> String {
    format!("Update to {}\n{}", tag, BODY_SIGNATURE)
}

/// Opens pull requests on the target repository with the bot's API client
pub struct Publisher<P> {
    api: P,
}

impl<P: PullRequestApi> Publisher<P> {
    pub fn new(api: P) -> Self {
        Publisher { api }
    }

    /// Open a pull request merging `branch_name` into `base_branch`.
    ///
    /// Attempted exactly once. Token problems surface as `Auth`, everything
    /// else the platform rejects (unknown branch, duplicate pull request) as `Api`.
    pub async fn create(
        &self,
        reference: &RepositoryReference,
        branch_name: &str,
        base_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRecord> {
        let draft = PullRequestDraft {
            title: title.to_string(),
            head: branch_name.to_string(),
            base: base_branch.to_string(),
            body: body.to_string(),
        };

        let record = self.api.create_pull_request(reference, &draft).await?;
        info!(repository = %reference, number = record.number, url = %record.url, "created pull request");
        Ok(record)
    }
}
