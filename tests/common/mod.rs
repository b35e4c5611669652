#![allow(dead_code)]

use git2::{Oid, Repository, Signature};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use tagtrooper::git::{Credentials, Workspace, WorkspaceOptions};
use tagtrooper::rewrite::{PatternRewriter, RewriteRule};

pub const DOCKERFILE: &str = "FROM alpine:3.19\nARG VERSION=1.2.3\nRUN echo $VERSION\n";

/// A bare repository standing in for the target on GitHub, plus a directory
/// for the workspace clone.
pub struct Fixture {
    pub dir: TempDir,
    pub master: Oid,
}

impl Fixture {
    /// Bare remote whose `master` holds a single Dockerfile
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let remote = Repository::init_bare(dir.path().join("remote.git"))
            .expect("Could not init bare repo");

        let blob = remote.blob(DOCKERFILE.as_bytes()).unwrap();
        let mut builder = remote.treebuilder(None).unwrap();
        builder.insert("Dockerfile", blob, 0o100644).unwrap();
        builder
            .insert("README.md", remote.blob(b"ARG VERSION=1.2.3\n").unwrap(), 0o100644)
            .unwrap();
        let tree = remote.find_tree(builder.write().unwrap()).unwrap();

        let signature = Signature::now("Upstream", "upstream@example.com").unwrap();
        let master = remote
            .commit(
                Some("refs/heads/master"),
                &signature,
                &signature,
                "Initial commit",
                &tree,
                &[],
            )
            .unwrap();
        remote.set_head("refs/heads/master").unwrap();

        Fixture { dir, master }
    }

    pub fn remote_path(&self) -> PathBuf {
        self.dir.path().join("remote.git")
    }

    pub fn clone_path(&self) -> PathBuf {
        self.dir.path().join("clone")
    }

    pub fn remote(&self) -> Repository {
        Repository::open_bare(self.remote_path()).expect("Could not open remote")
    }

    /// Create `refs/heads/<branch>` on the remote pointing at a commit that
    /// shares no history with master, so a non-forced push to it is rejected.
    pub fn add_unrelated_branch(&self, branch: &str) -> Oid {
        let remote = self.remote();
        let blob = remote.blob(b"unrelated\n").unwrap();
        let mut builder = remote.treebuilder(None).unwrap();
        builder.insert("NOTES", blob, 0o100644).unwrap();
        let tree = remote.find_tree(builder.write().unwrap()).unwrap();

        let signature = Signature::now("Someone", "someone@example.com").unwrap();
        remote
            .commit(
                Some(&format!("refs/heads/{}", branch)),
                &signature,
                &signature,
                "Unrelated",
                &tree,
                &[],
            )
            .unwrap()
    }

    pub fn open_workspace(&self) -> Workspace {
        let options = WorkspaceOptions {
            credentials: Credentials::new("tagtrooper-bot", "token"),
            ..WorkspaceOptions::default()
        };
        Workspace::open(
            self.remote_path().to_str().unwrap(),
            self.clone_path(),
            options,
        )
        .expect("Could not open workspace")
    }
}

pub fn dockerfile_rewriter() -> PatternRewriter {
    let rule = RewriteRule::new(r"^ARG VERSION=.*$", "ARG VERSION=%s\n", "Dockerfile").unwrap();
    PatternRewriter::new(rule)
}

/// Content of `path` in the tree of the commit `refname` points at
pub fn file_at(repo: &Repository, refname: &str, path: &str) -> String {
    let commit = repo
        .find_reference(refname)
        .unwrap()
        .peel_to_commit()
        .unwrap();
    let entry = commit.tree().unwrap().get_path(Path::new(path)).unwrap();
    let blob = repo.find_blob(entry.id()).unwrap();
    String::from_utf8(blob.content().to_vec()).unwrap()
}
