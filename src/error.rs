use thiserror::Error;

/// Unified error type for tagtrooper operations
#[derive(Error, Debug)]
pub enum TagTrooperError {
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Tag listing failed: {0}")]
    TagList(String),

    #[error("Clone failed: {0}")]
    Clone(String),

    #[error("Cannot open workspace: {0}")]
    Open(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("No files modified for tag {0}")]
    NoChanges(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Updater failed: {0}")]
    Updater(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("GitHub API error: {0}")]
    Api(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in tagtrooper
pub type Result<T> = std::result::Result<T, TagTrooperError>;

/// How a failure is handled by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad URL or pattern. Fatal before any cycle runs.
    Config,
    /// Tag listing failed while polling. The loop keeps going.
    TransientApi,
    /// Clone, open, fetch, commit or push failed. The cycle is abandoned.
    Workspace,
    /// The rewrite touched nothing.
    NoChanges,
    /// Opening the pull request failed.
    Publish,
}

impl TagTrooperError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        TagTrooperError::Config(msg.into())
    }

    pub fn invalid_url(msg: impl Into<String>) -> Self {
        TagTrooperError::InvalidUrl(msg.into())
    }

    pub fn tag_list(msg: impl Into<String>) -> Self {
        TagTrooperError::TagList(msg.into())
    }

    pub fn clone_failed(msg: impl Into<String>) -> Self {
        TagTrooperError::Clone(msg.into())
    }

    pub fn open(msg: impl Into<String>) -> Self {
        TagTrooperError::Open(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        TagTrooperError::Fetch(msg.into())
    }

    pub fn commit(msg: impl Into<String>) -> Self {
        TagTrooperError::Commit(msg.into())
    }

    pub fn push(msg: impl Into<String>) -> Self {
        TagTrooperError::Push(msg.into())
    }

    pub fn updater(msg: impl Into<String>) -> Self {
        TagTrooperError::Updater(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        TagTrooperError::Auth(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        TagTrooperError::Api(msg.into())
    }

    /// Classify the error for the orchestrator's failure handling
    pub fn class(&self) -> ErrorClass {
        match self {
            TagTrooperError::InvalidUrl(_)
            | TagTrooperError::Config(_)
            | TagTrooperError::InvalidPattern(_) => ErrorClass::Config,
            TagTrooperError::TagList(_) => ErrorClass::TransientApi,
            TagTrooperError::NoChanges(_) => ErrorClass::NoChanges,
            TagTrooperError::Auth(_) | TagTrooperError::Api(_) => ErrorClass::Publish,
            TagTrooperError::Clone(_)
            | TagTrooperError::Open(_)
            | TagTrooperError::Fetch(_)
            | TagTrooperError::Commit(_)
            | TagTrooperError::Push(_)
            | TagTrooperError::Updater(_)
            | TagTrooperError::Git(_)
            | TagTrooperError::Io(_) => ErrorClass::Workspace,
        }
    }
}
