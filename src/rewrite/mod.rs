//! Content mutation of the workspace tree
//!
//! A cycle changes the target repository through a [ContentMutator]. Two
//! implementations exist and are chosen by configuration:
//!
//! - [pattern::PatternRewriter]: regex line rewrite in files matching a name pattern
//! - [command::CommandUpdater]: runs an external program that edits the tree itself

pub mod command;
pub mod pattern;

pub use command::CommandUpdater;
pub use pattern::{PatternRewriter, RewriteRule};

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory name never entered or reported while mutating the tree
pub const GIT_DIR: &str = ".git";

/// Applies a new version to the files under a workspace root
pub trait ContentMutator {
    /// Mutate the tree under `root` for `new_value` and return the paths that
    /// changed, relative to `root`, in the order they were changed.
    ///
    /// An empty result means the tree already reflects `new_value`.
    fn apply(&self, root: &Path, new_value: &str) -> Result<Vec<PathBuf>>;
}

/// Mutator selected at startup
#[derive(Debug, Clone)]
pub enum Mutator {
    Pattern(PatternRewriter),
    Command(CommandUpdater),
}

impl ContentMutator for Mutator {
    fn apply(&self, root: &Path, new_value: &str) -> Result<Vec<PathBuf>> {
        match self {
            Mutator::Pattern(rewriter) => rewriter.apply(root, new_value),
            Mutator::Command(updater) => updater.apply(root, new_value),
        }
    }
}
