//! Git operations on the target repository workspace
//!
//! The [Workspace] owns the local clone the pipeline mutates. It is created
//! once at startup and reused for every cycle:
//!
//! ```text
//! sync() -> create_and_apply_change() -> publish_branch()
//! ```
//!
//! Remote access authenticates over HTTPS with the bot [Credentials], which
//! are supplied by configuration.

pub mod workspace;

pub use workspace::Workspace;

use git2::{Cred, CredentialType, RemoteCallbacks};
use std::fmt;

/// Name of the remote the workspace was cloned from
pub const DEFAULT_REMOTE: &str = "origin";

/// Static bot credentials for HTTPS basic authentication
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Author and committer of the commits the bot creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub name: String,
    pub email: String,
}

impl Default for BotIdentity {
    fn default() -> Self {
        BotIdentity {
            name: "Tag Trooper".to_string(),
            email: "tagtrooper@users.noreply.github.com".to_string(),
        }
    }
}

/// Everything the workspace needs besides the clone itself
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    pub credentials: Credentials,
    pub identity: BotIdentity,
    /// Branch the working tree is reset to on every sync
    pub base_branch: String,
    pub remote: String,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        WorkspaceOptions {
            credentials: Credentials::default(),
            identity: BotIdentity::default(),
            base_branch: "master".to_string(),
            remote: DEFAULT_REMOTE.to_string(),
        }
    }
}

/// Callbacks answering credential requests with the bot credentials.
///
/// libgit2 asks again after a rejected attempt, so the second request fails
/// instead of looping.
pub(crate) fn remote_callbacks<'a>(credentials: &Credentials) -> RemoteCallbacks<'a> {
    let credentials = credentials.clone();
    let mut attempted = false;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, _username_from_url, allowed_types| {
        if attempted {
            return Err(git2::Error::from_str(&format!(
                "credentials for '{}' were rejected by {}",
                credentials.username, url
            )));
        }
        attempted = true;

        if !credentials.is_empty() && allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            Cred::userpass_plaintext(&credentials.username, &credentials.token)
        } else {
            Cred::default()
        }
    });
    callbacks
}
