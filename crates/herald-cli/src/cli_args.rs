use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "herald",
    about = "Announce pull requests needing review in Slack and clean up stale announcements",
    version
)]
pub struct Cli {
    #[arg(
        long = "slack-bot-token",
        env = "SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token used to list channels, read history and post"
    )]
    pub slack_bot_token: String,

    #[arg(
        long = "slack-user-token",
        env = "SLACK_USER_TOKEN",
        hide_env_values = true,
        help = "Optional Slack user token; enables deleting messages the bot did not post and check-mark cleanup"
    )]
    pub slack_user_token: Option<String>,

    #[arg(
        long = "slack-channel",
        env = "HERALD_SLACK_CHANNEL",
        default_value = "code-review",
        help = "Channel (name or id) the bot announces into; a leading # is ignored"
    )]
    pub slack_channel: String,

    #[arg(
        long = "slack-api-base",
        env = "HERALD_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Base URL for the Slack Web API"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token with pull request and issue write access (required for announce)"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "github-repo",
        env = "GITHUB_REPOSITORY",
        help = "Repository in owner/repo form, used when the event payload names none"
    )]
    pub github_repo: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "HERALD_GITHUB_API_BASE",
        default_value = "https://api.github.com",
        help = "Base URL for the GitHub REST API"
    )]
    pub github_api_base: String,

    #[arg(
        long = "default-repo",
        env = "HERALD_DEFAULT_REPO",
        help = "Repository whose announcements omit the ' in owner/repo' suffix"
    )]
    pub default_repo: Option<String>,

    #[arg(
        long,
        env = "HERALD_MENTION",
        help = "Text prefixed to announcements, e.g. @reviewers"
    )]
    pub mention: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        env = "HERALD_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each Slack and GitHub HTTP request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "HERALD_RETRY_MAX_ATTEMPTS",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Attempts per HTTP request for rate limits and server errors; 1 disables retries"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "HERALD_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        help = "Base backoff between retried HTTP requests"
    )]
    pub retry_base_delay_ms: u64,

    #[command(subcommand)]
    pub command: HeraldCommand,
}

#[derive(Debug, Subcommand)]
pub enum HeraldCommand {
    /// Announce the pull request from the event payload if it still needs review.
    Announce(EventArgs),
    /// Delete stale announcements and check-marked messages for a pull request.
    Reconcile(ReconcileArgs),
    /// Pick announce or reconcile from the event's action.
    Dispatch(EventArgs),
}

#[derive(Debug, Args)]
pub struct EventArgs {
    #[arg(
        long = "event-path",
        env = "GITHUB_EVENT_PATH",
        help = "Path to the pull_request event payload JSON"
    )]
    pub event_path: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[arg(long = "pr-url", help = "Pull request URL; takes precedence over --event-path")]
    pub pr_url: Option<String>,

    #[arg(
        long = "event-path",
        env = "GITHUB_EVENT_PATH",
        help = "Path to the pull_request event payload JSON"
    )]
    pub event_path: Option<PathBuf>,
}
