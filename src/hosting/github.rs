//! GitHub REST API client backed by octocrab.

use octocrab::Octocrab;

use super::{PullRequestApi, PullRequestDraft, TagSource};
use crate::domain::{PullRequestRecord, RepositoryReference, TagState};
use crate::error::{Result, TagTrooperError};

/// Tags requested per listing. Only the first entry is ever inspected.
const TAGS_PER_PAGE: u8 = 100;

/// GitHub API client authenticated with the bot token.
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Creates a client using a personal access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(|e| TagTrooperError::config(format!("Cannot build GitHub client: {}", e)))?;
        Ok(Self { client })
    }

    /// Creates a client without credentials. Only public data is readable
    /// and the rate limit is low.
    pub fn anonymous() -> Result<Self> {
        let client = Octocrab::builder()
            .build()
            .map_err(|e| TagTrooperError::config(format!("Cannot build GitHub client: {}", e)))?;
        Ok(Self { client })
    }

    /// Creates a client from a pre-configured Octocrab instance.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient").finish_non_exhaustive()
    }
}

impl TagSource for GitHubClient {
    async fn list_tags(&self, repository: &RepositoryReference) -> Result<Vec<TagState>> {
        let page = self
            .client
            .repos(repository.owner.as_str(), repository.name.as_str())
            .list_tags()
            .per_page(TAGS_PER_PAGE)
            .send()
            .await
            .map_err(|e| {
                TagTrooperError::tag_list(format!("Cannot list tags of {}: {}", repository, e))
            })?;

        Ok(page
            .items
            .into_iter()
            .map(|tag| TagState::new(tag.name, tag.commit.sha))
            .collect())
    }
}

impl PullRequestApi for GitHubClient {
    async fn create_pull_request(
        &self,
        repository: &RepositoryReference,
        draft: &PullRequestDraft,
    ) -> Result<PullRequestRecord> {
        let pull = self
            .client
            .pulls(repository.owner.as_str(), repository.name.as_str())
            .create(
                draft.title.as_str(),
                draft.head.as_str(),
                draft.base.as_str(),
            )
            .body(draft.body.as_str())
            .send()
            .await
            .map_err(|e| {
                let message = format!(
                    "Cannot open pull request {} -> {} on {}: {}",
                    draft.head, draft.base, repository, e
                );
                if is_auth_failure(status_code(&e), &message) {
                    TagTrooperError::auth(message)
                } else {
                    TagTrooperError::api(message)
                }
            })?;

        let url = pull
            .html_url
            .map(|url| url.to_string())
            .unwrap_or(pull.url);

        Ok(PullRequestRecord {
            number: pull.number,
            url,
        })
    }
}

/// HTTP status reported by GitHub, if the error came from an API response.
fn status_code(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Whether a failed request was rejected because of the token.
///
/// GitHub answers 401 for missing or invalid tokens, and some endpoints
/// answer 403 with "Bad credentials" instead.
pub fn is_auth_failure(status: Option<u16>, message: &str) -> bool {
    matches!(status, Some(401)) || message.to_lowercase().contains("bad credentials")
}
