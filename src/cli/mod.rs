//! Pipeline driving: run-once and poll-loop modes.

pub mod orchestration;

pub use orchestration::{Orchestrator, RunOutcome, RunSettings};
