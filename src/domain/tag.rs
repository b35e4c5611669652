/// Prefix of every branch tagtrooper pushes
pub const BRANCH_PREFIX: &str = "tt-";

/// A tag of the monitored repository as reported by the hosting API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagState {
    pub name: String,
    pub commit_sha: String,
}

impl TagState {
    /// Create a new tag state
    pub fn new(name: impl Into<String>, commit_sha: impl Into<String>) -> Self {
        TagState {
            name: name.into(),
            commit_sha: commit_sha.into(),
        }
    }

    /// Abbreviated commit hash for log lines
    pub fn short_sha(&self) -> &str {
        self.commit_sha
            .char_indices()
            .nth(7)
            .map(|(idx, _)| &self.commit_sha[..idx])
            .unwrap_or(&self.commit_sha)
    }
}

/// Branch name used for the change set of `tag` (e.g. "1.4.0" -> "tt-1.4.0")
pub fn branch_name_for(tag: &str) -> String {
    format!("{}{}", BRANCH_PREFIX, tag)
}

/// Full reference of the branch pushed for `tag`
pub fn branch_ref_for(tag: &str) -> String {
    format!("refs/heads/{}", branch_name_for(tag))
}

/// Full reference of the tag mirrored into the target repository
pub fn tag_ref_for(tag: &str) -> String {
    format!("refs/tags/{}", tag)
}
