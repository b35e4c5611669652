use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tagtrooper::cli::{Orchestrator, RunSettings};
use tagtrooper::config::{self, Overrides, Settings};
use tagtrooper::git::Workspace;
use tagtrooper::hosting::GitHubClient;
use tagtrooper::publisher::Publisher;
use tagtrooper::ui;
use tagtrooper::watcher::TagWatcher;

#[derive(clap::Parser)]
#[command(
    name = "tagtrooper",
    version,
    about = "Watch a repository for new tags and open pull requests applying them to another"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Repository watched for new tags")]
    monitor_url: Option<String>,

    #[arg(short, long, help = "Repository the new tag is applied to")]
    target_url: Option<String>,

    #[arg(short, long, help = "Seconds between two tag listings")]
    interval: Option<u64>,

    #[arg(long, help = "Run a single cycle with the latest tag and exit")]
    once: bool,

    #[arg(long, help = "Apply this tag instead of the latest one (implies --once)")]
    tag: Option<String>,

    #[arg(long, help = "Commit locally but push nothing and open no pull request")]
    dry_run: bool,

    #[arg(short, long, help = "Directory holding the clone of the target repository")]
    workdir: Option<PathBuf>,

    #[arg(short, long, help = "Branch pull requests are opened against")]
    base_branch: Option<String>,

    #[arg(short, long, help = "Bot account name")]
    username: Option<String>,

    #[arg(long, env = "TAGTROOPER_TOKEN", hide_env_values = true, help = "Bot access token")]
    token: Option<String>,

    #[arg(short, long, help = "Regex selecting the lines to rewrite")]
    regex: Option<String>,

    #[arg(short, long, help = "Replacement for matching lines, %s is the tag")]
    format: Option<String>,

    #[arg(short = 'p', long, help = "Regex selecting the files to rewrite by name")]
    file_pattern: Option<String>,

    #[arg(long, help = "Program that updates the tree instead of the regex rewrite")]
    updater: Option<PathBuf>,

    #[arg(short, long, help = "Log debug output")]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            monitor_url: self.monitor_url.clone(),
            target_url: self.target_url.clone(),
            interval: self.interval,
            run_once: self.once,
            tag: self.tag.clone(),
            dry_run: self.dry_run,
            workdir: self.workdir.clone(),
            base_branch: self.base_branch.clone(),
            username: self.username.clone(),
            token: self.token.clone(),
            regex: self.regex.clone(),
            format: self.format.clone(),
            file_pattern: self.file_pattern.clone(),
            updater: self.updater.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "tagtrooper=debug"
    } else {
        "tagtrooper=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let settings = match Settings::resolve(file_config, args.overrides()) {
        Ok(settings) => settings,
        Err(e) => {
            ui::display_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    ui::display_startup(&settings);

    let client = if settings.workspace.credentials.is_empty() {
        GitHubClient::anonymous()?
    } else {
        GitHubClient::from_token(settings.workspace.credentials.token.clone())?
    };

    let workspace = match Workspace::open(
        &settings.target.clone_url(),
        &settings.workdir,
        settings.workspace.clone(),
    ) {
        Ok(workspace) => workspace,
        Err(e) => {
            ui::display_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut orchestrator = Orchestrator::new(
        TagWatcher::new(client.clone(), settings.monitor.clone()),
        workspace,
        settings.mutator.clone(),
        Publisher::new(client),
        RunSettings {
            target: settings.target.clone(),
            dry_run: settings.dry_run,
        },
    );

    if !settings.run_once {
        orchestrator.run_poll_loop(settings.interval).await;
        return Ok(ExitCode::SUCCESS);
    }

    match orchestrator.run_once(settings.tag.as_deref()).await {
        Ok(outcome) => {
            ui::display_outcome(&outcome);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            ui::display_error(&e.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}
