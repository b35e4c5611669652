pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod hosting;
pub mod publisher;
pub mod rewrite;
pub mod ui;
pub mod watcher;

pub use error::{Result, TagTrooperError};
