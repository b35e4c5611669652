use git2::{Repository, Status, StatusOptions};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::ContentMutator;
use crate::error::{Result, TagTrooperError};

/// Environment variable carrying the new tag to the updater program
pub const TAG_ENV_VAR: &str = "TT_TAG";

/// Runs an external updater program inside the workspace
///
/// The program is started with the workspace root as working directory and
/// the new tag in `TT_TAG`. It may edit, add or delete any file; the changed
/// paths are read back from git status afterwards.
#[derive(Debug, Clone)]
pub struct CommandUpdater {
    program: PathBuf,
}

impl CommandUpdater {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandUpdater {
            program: program.into(),
        }
    }

    /// Relative programs with a directory part (`./update.sh`) live in the workspace
    fn resolve_program(&self, root: &Path) -> PathBuf {
        if self.program.is_relative() && self.program.components().count() > 1 {
            root.join(&self.program)
        } else {
            self.program.clone()
        }
    }
}

impl ContentMutator for CommandUpdater {
    fn apply(&self, root: &Path, new_value: &str) -> Result<Vec<PathBuf>> {
        let program = self.resolve_program(root);
        debug!(program = %program.display(), tag = new_value, "running updater");

        let output = Command::new(&program)
            .current_dir(root)
            .env(TAG_ENV_VAR, new_value)
            .output()
            .map_err(|e| {
                TagTrooperError::updater(format!("Failed to execute {}: {}", program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(TagTrooperError::updater(format!(
                "{} failed with exit code {}\nStdout: {}\nStderr: {}",
                program.display(),
                output.status.code().unwrap_or(-1),
                stdout,
                stderr
            )));
        }

        changed_paths(root)
    }
}

/// Working tree paths that differ from the index, untracked files included
pub fn changed_paths(root: &Path) -> Result<Vec<PathBuf>> {
    let repo = Repository::open(root)?;

    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let changed = Status::WT_NEW
        | Status::WT_MODIFIED
        | Status::WT_DELETED
        | Status::WT_TYPECHANGE
        | Status::WT_RENAMED;

    let statuses = repo.statuses(Some(&mut options))?;
    Ok(statuses
        .iter()
        .filter(|entry| entry.status().intersects(changed))
        .filter_map(|entry| entry.path().map(PathBuf::from))
        .collect())
}
