//! Domain types - pure values shared by the watcher, workspace and publisher

pub mod change;
pub mod repository;
pub mod tag;

pub use change::{ChangeSet, CyclePhase, PullRequestRecord};
pub use repository::RepositoryReference;
pub use tag::{branch_name_for, TagState};
