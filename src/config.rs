use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::RepositoryReference;
use crate::error::{Result, TagTrooperError};
use crate::git::{BotIdentity, Credentials, WorkspaceOptions, DEFAULT_REMOTE};
use crate::rewrite::{CommandUpdater, Mutator, PatternRewriter, RewriteRule};

/// File name searched in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "tagtrooper.toml";

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_WORKDIR: &str = "/tmp/tagtrooper/";
pub const DEFAULT_BASE_BRANCH: &str = "master";
pub const DEFAULT_LINE_REGEX: &str = ".*[0-9]*.[0-9]*.[0-9]*.*";
pub const DEFAULT_FORMAT: &str = "%s\n";
pub const DEFAULT_FILE_PATTERN: &str = ".*Dockerfile.*";
pub const DEFAULT_UPDATER: &str = "./tagtrooper";

/// Contents of a `tagtrooper.toml` file.
///
/// Every field is optional in the file. Command line flags are layered on
/// top with [Settings::resolve].
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Repository watched for new tags
    #[serde(default)]
    pub monitor_url: Option<String>,

    /// Repository the change is applied to
    #[serde(default)]
    pub target_url: Option<String>,

    /// Seconds between two tag listings
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default)]
    pub run_once: bool,

    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKDIR)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            monitor_url: None,
            target_url: None,
            interval: default_interval(),
            run_once: false,
            base_branch: default_base_branch(),
            workdir: default_workdir(),
            bot: BotConfig::default(),
            rewrite: RewriteConfig::default(),
        }
    }
}

/// Account that pushes branches and opens pull requests
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BotConfig {
    #[serde(default)]
    pub username: String,

    /// Usually left out of the file and passed through `TAGTROOPER_TOKEN`
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_bot_name")]
    pub name: String,

    #[serde(default = "default_bot_email")]
    pub email: String,
}

fn default_bot_name() -> String {
    BotIdentity::default().name
}

fn default_bot_email() -> String {
    BotIdentity::default().email
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            username: String::new(),
            token: String::new(),
            name: default_bot_name(),
            email: default_bot_email(),
        }
    }
}

/// How the target tree is changed
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RewriteMode {
    #[default]
    Pattern,
    Command,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RewriteConfig {
    #[serde(default)]
    pub mode: RewriteMode,

    /// Lines matching this regex are replaced
    #[serde(default = "default_line_regex")]
    pub regex: String,

    /// Replacement; `%s` receives the tag
    #[serde(default = "default_format")]
    pub format: String,

    /// Only files whose base name matches are rewritten
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,

    /// Updater program run in `command` mode
    #[serde(default = "default_updater")]
    pub command: PathBuf,
}

fn default_line_regex() -> String {
    DEFAULT_LINE_REGEX.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_updater() -> PathBuf {
    PathBuf::from(DEFAULT_UPDATER)
}

impl Default for RewriteConfig {
    fn default() -> Self {
        RewriteConfig {
            mode: RewriteMode::default(),
            regex: default_line_regex(),
            format: default_format(),
            file_pattern: default_file_pattern(),
            command: default_updater(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `tagtrooper.toml` in current directory
/// 3. `tagtrooper.toml` in user config directory
/// 4. Default configuration if no file found
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else {
        match dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)) {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        }
    };

    let content = fs::read_to_string(&path).map_err(|e| {
        TagTrooperError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| TagTrooperError::config(format!("Cannot parse {}: {}", path.display(), e)))
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub monitor_url: Option<String>,
    pub target_url: Option<String>,
    pub interval: Option<u64>,
    pub run_once: bool,
    pub tag: Option<String>,
    pub dry_run: bool,
    pub workdir: Option<PathBuf>,
    pub base_branch: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
    pub regex: Option<String>,
    pub format: Option<String>,
    pub file_pattern: Option<String>,
    pub updater: Option<PathBuf>,
}

/// Validated settings for one monitored/target pair
#[derive(Debug, Clone)]
pub struct Settings {
    pub monitor: RepositoryReference,
    pub target: RepositoryReference,
    pub interval: Duration,
    pub run_once: bool,
    /// Tag applied in run-once mode instead of the latest one
    pub tag: Option<String>,
    pub dry_run: bool,
    pub workdir: PathBuf,
    pub workspace: WorkspaceOptions,
    pub mutator: Mutator,
}

impl Settings {
    /// Merge `overrides` into `config` and validate the result.
    ///
    /// URLs are parsed and regexes compiled here so that a bad value fails
    /// before any network access. A token is only required when something
    /// is going to be pushed.
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self> {
        let monitor_url = overrides
            .monitor_url
            .or(config.monitor_url)
            .ok_or_else(|| TagTrooperError::config("No repository to monitor (--monitor-url)"))?;
        let target_url = overrides
            .target_url
            .or(config.target_url)
            .ok_or_else(|| TagTrooperError::config("No target repository (--target-url)"))?;

        let monitor = RepositoryReference::parse(&monitor_url)?;
        let target = RepositoryReference::parse(&target_url)?;

        let interval = overrides.interval.unwrap_or(config.interval);
        if interval == 0 {
            return Err(TagTrooperError::config("Interval must be at least one second"));
        }

        let dry_run = overrides.dry_run;
        let credentials = Credentials::new(
            overrides.username.unwrap_or(config.bot.username),
            overrides.token.unwrap_or(config.bot.token),
        );
        if credentials.is_empty() && !dry_run {
            return Err(TagTrooperError::config(
                "No bot token (--token or TAGTROOPER_TOKEN)",
            ));
        }

        let rewrite = config.rewrite;
        let mutator = match (overrides.updater, rewrite.mode) {
            (Some(program), _) => Mutator::Command(CommandUpdater::new(program)),
            (None, RewriteMode::Command) => Mutator::Command(CommandUpdater::new(rewrite.command)),
            (None, RewriteMode::Pattern) => {
                let rule = RewriteRule::new(
                    &overrides.regex.unwrap_or(rewrite.regex),
                    overrides.format.unwrap_or(rewrite.format),
                    &overrides.file_pattern.unwrap_or(rewrite.file_pattern),
                )?;
                Mutator::Pattern(PatternRewriter::new(rule))
            }
        };

        Ok(Settings {
            monitor,
            target,
            interval: Duration::from_secs(interval),
            run_once: overrides.run_once || config.run_once || overrides.tag.is_some(),
            tag: overrides.tag,
            dry_run,
            workdir: overrides.workdir.unwrap_or(config.workdir),
            workspace: WorkspaceOptions {
                credentials,
                identity: BotIdentity {
                    name: config.bot.name,
                    email: config.bot.email,
                },
                base_branch: overrides.base_branch.unwrap_or(config.base_branch),
                remote: DEFAULT_REMOTE.to_string(),
            },
            mutator,
        })
    }
}
