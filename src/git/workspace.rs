use git2::build::RepoBuilder;
use git2::{FetchOptions, Oid, PushOptions, Repository, ResetType, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{remote_callbacks, WorkspaceOptions};
use crate::domain::tag::{branch_name_for, branch_ref_for};
use crate::domain::ChangeSet;
use crate::error::{Result, TagTrooperError};
use crate::rewrite::ContentMutator;

/// Local clone of the target repository
///
/// Commits are created on a detached HEAD so no local branch besides the
/// `tt-*` branches is ever moved. Refs from earlier cycles are kept.
pub struct Workspace {
    repo: Repository,
    path: PathBuf,
    options: WorkspaceOptions,
}

impl Workspace {
    /// Clone `url` into `local_path`, or open the clone already there.
    ///
    /// The directory is cloned into when it is missing or empty.
    pub fn open<P: AsRef<Path>>(
        url: &str,
        local_path: P,
        options: WorkspaceOptions,
    ) -> Result<Self> {
        let path = local_path.as_ref().to_path_buf();

        let repo = if is_missing_or_empty(&path)? {
            info!(url, path = %path.display(), "cloning target repository");
            fs::create_dir_all(&path)?;

            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(remote_callbacks(&options.credentials));

            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch_options);
            builder.clone(url, &path).map_err(|e| {
                TagTrooperError::clone_failed(format!(
                    "Cannot clone {} into {}: {}",
                    url,
                    path.display(),
                    e
                ))
            })?
        } else {
            debug!(path = %path.display(), "opening existing clone");
            Repository::open(&path).map_err(|e| {
                TagTrooperError::open(format!("Cannot open {}: {}", path.display(), e))
            })?
        };

        if repo.is_bare() {
            return Err(TagTrooperError::open(format!(
                "{} is a bare repository",
                path.display()
            )));
        }

        Ok(Workspace {
            repo,
            path,
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &WorkspaceOptions {
        &self.options
    }

    /// Fetch branches and tags, then reset the working tree to the remote base branch.
    ///
    /// Nothing to fetch is not an error. Returns the commit the tree was reset to.
    pub fn sync(&self) -> Result<Oid> {
        let remote_name = &self.options.remote;
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            TagTrooperError::fetch(format!("Remote '{}' not found: {}", remote_name, e))
        })?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(&self.options.credentials));

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];
        remote
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                TagTrooperError::fetch(format!("Cannot fetch from '{}': {}", remote_name, e))
            })?;

        if remote.stats().received_objects() == 0 {
            debug!(remote = %remote_name, "already up to date");
        }

        let base_ref = format!("refs/remotes/{}/{}", remote_name, self.options.base_branch);
        let base_oid = self.repo.refname_to_id(&base_ref).map_err(|e| {
            TagTrooperError::fetch(format!("Base branch {} not found: {}", base_ref, e))
        })?;

        self.reset_to(base_oid)
            .map_err(|e| TagTrooperError::fetch(format!("Cannot reset to {}: {}", base_ref, e)))?;

        info!(base = %base_ref, commit = %base_oid, "workspace synced");
        Ok(base_oid)
    }

    fn reset_to(&self, oid: Oid) -> std::result::Result<(), git2::Error> {
        let commit = self.repo.find_commit(oid)?;
        self.repo.set_head_detached(oid)?;
        self.repo.reset(commit.as_object(), ResetType::Hard, None)
    }

    /// Apply `tag` to the working tree with `mutator` and commit the result.
    ///
    /// Only the files the mutator reports are staged. When nothing changed no
    /// commit or ref is created and `NoChanges` is returned, so a tag that is
    /// already applied never produces a second commit.
    pub fn create_and_apply_change<M: ContentMutator>(
        &self,
        tag: &str,
        mutator: &M,
    ) -> Result<ChangeSet> {
        let modified_paths = self.apply_change(tag, mutator)?;
        self.commit_change(tag, modified_paths)
    }

    /// Run `mutator` over the working tree. Fails with `NoChanges` when it
    /// reports no modified file.
    pub fn apply_change<M: ContentMutator>(
        &self,
        tag: &str,
        mutator: &M,
    ) -> Result<Vec<PathBuf>> {
        let modified_paths = mutator.apply(self.workdir()?, tag)?;
        if modified_paths.is_empty() {
            return Err(TagTrooperError::NoChanges(tag.to_string()));
        }
        for path in &modified_paths {
            debug!(path = %path.display(), "modified");
        }
        Ok(modified_paths)
    }

    /// Commit `modified_paths` with the bot identity and point the branch
    /// `tt-<tag>` and the tag `<tag>` at the new commit.
    pub fn commit_change(&self, tag: &str, modified_paths: Vec<PathBuf>) -> Result<ChangeSet> {
        let branch_name = branch_name_for(tag);

        let commit_id = self
            .commit_paths(tag, &modified_paths)
            .map_err(|e| TagTrooperError::commit(format!("Cannot commit tag {}: {}", tag, e)))?
            .ok_or_else(|| TagTrooperError::NoChanges(tag.to_string()))?;

        let reflog = format!("tagtrooper: update to {}", tag);
        self.repo
            .reference(&branch_ref_for(tag), commit_id, true, &reflog)
            .map_err(|e| {
                TagTrooperError::commit(format!("Cannot create branch {}: {}", branch_name, e))
            })?;

        let object = self.repo.find_object(commit_id, None)?;
        self.repo
            .tag_lightweight(tag, &object, true)
            .map_err(|e| TagTrooperError::commit(format!("Cannot create tag {}: {}", tag, e)))?;

        info!(branch = %branch_name, tag, commit = %commit_id, files = modified_paths.len(), "change committed");

        Ok(ChangeSet {
            branch_name,
            tag_name: tag.to_string(),
            modified_paths,
            commit_id,
        })
    }

    fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| TagTrooperError::open("workspace has no working tree"))
    }

    /// Stage `paths` and commit them on HEAD. `None` when the staged tree equals HEAD's.
    fn commit_paths(
        &self,
        tag: &str,
        paths: &[PathBuf],
    ) -> std::result::Result<Option<Oid>, git2::Error> {
        let root = self
            .repo
            .workdir()
            .ok_or_else(|| git2::Error::from_str("workspace has no working tree"))?;
        let mut index = self.repo.index()?;
        for path in paths {
            if root.join(path).exists() {
                index.add_path(path)?;
            } else {
                index.remove_path(path)?;
            }
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let parent = self.repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_id {
            return Ok(None);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let identity = &self.options.identity;
        let signature = Signature::now(&identity.name, &identity.email)?;
        let message = format!("Update to tag {}", tag);

        self.repo
            .commit(Some("HEAD"), &signature, &signature, &message, &tree, &[&parent])
            .map(Some)
    }

    /// Push the change set's branch and tag to the remote under the same names.
    ///
    /// A ref rejected by the remote fails the push even if the transport
    /// itself succeeded.
    pub fn publish_branch(&self, change_set: &ChangeSet) -> Result<()> {
        let remote_name = &self.options.remote;
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            TagTrooperError::push(format!("Remote '{}' not found: {}", remote_name, e))
        })?;

        let refspecs = change_set.push_refspecs();
        let mut rejected = Vec::new();

        {
            let mut callbacks = remote_callbacks(&self.options.credentials);
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected.push(format!("{} ({})", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote
                .push(&refspecs, Some(&mut push_options))
                .map_err(|e| {
                    TagTrooperError::push(format!(
                        "Cannot push {} to '{}': {}",
                        change_set.branch_name, remote_name, e
                    ))
                })?;
        }

        if !rejected.is_empty() {
            return Err(TagTrooperError::push(format!(
                "Remote '{}' rejected {}",
                remote_name,
                rejected.join(", ")
            )));
        }

        info!(branch = %change_set.branch_name, tag = %change_set.tag_name, remote = %remote_name, "pushed");
        Ok(())
    }
}

fn is_missing_or_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}
