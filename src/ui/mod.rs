//! User interface module - terminal output of the binary.
//!
//! Progress of a running pipeline goes through `tracing`. This module only
//! prints what a person running the tool by hand wants to read: the
//! startup banner and the outcome of a run-once invocation.

pub mod formatter;

pub use formatter::{
    display_error, display_outcome, display_startup, display_status, display_success,
    outcome_summary,
};
