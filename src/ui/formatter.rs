//! Formatting functions for terminal output.
//!
//! The `*_summary` functions build plain strings and are tested; the
//! `display_*` functions add `console` styling and print.

use console::style;

use crate::cli::RunOutcome;
use crate::config::Settings;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Show which repositories are paired and how the run proceeds.
pub fn display_startup(settings: &Settings) {
    println!(
        "\n{} {} -> {}",
        style("tagtrooper").bold(),
        style(&settings.monitor).cyan(),
        style(&settings.target).cyan()
    );

    let mode = if settings.run_once {
        "single run".to_string()
    } else {
        format!("polling every {}s", settings.interval.as_secs())
    };
    display_status(&format!(
        "{} into {}, base branch {}",
        mode,
        settings.workdir.display(),
        settings.workspace.base_branch
    ));

    if settings.dry_run {
        display_status("Dry run: nothing will be pushed");
    }
}

/// One line describing a finished run
pub fn outcome_summary(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Published(record) => format!("Opened pull request {}", record),
        RunOutcome::DryRun(change_set) => format!(
            "Committed {} file(s) on {} ({}), not pushed",
            change_set.modified_paths.len(),
            change_set.branch_name,
            change_set.commit_id
        ),
        RunOutcome::NoTags => "Monitored repository has no tags, nothing to do".to_string(),
    }
}

/// Print the outcome of a run-once invocation.
pub fn display_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::DryRun(change_set) => {
            display_success(&outcome_summary(outcome));
            for path in &change_set.modified_paths {
                println!("  {}", style(path.display()).dim());
            }
        }
        _ => display_success(&outcome_summary(outcome)),
    }
}
