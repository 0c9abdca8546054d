use std::path::Path;

use anyhow::{anyhow, Context, Result};
use herald_core::{
    maybe_announce, open_slack_session, reconcile_stale, AnnounceOutcome, AnnouncementOptions,
    PostDecision, SlackSessionConfig,
};
use herald_github::{
    load_pull_request_event, GithubApiClient, GithubClientSettings, PullRequestEvent,
    PullRequestSummary, RepoRef,
};
use herald_slack::SlackClientSettings;
use tracing::info;

use crate::cli_args::{Cli, HeraldCommand, ReconcileArgs};
use crate::event_dispatch::{route_for_event, EventRoute};

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        HeraldCommand::Announce(args) => {
            let event = load_event(&cli, &args.event_path)?;
            run_announce(&cli, &event.pull_request).await
        }
        HeraldCommand::Reconcile(args) => {
            let pr_url = reconcile_target(&cli, args)?;
            run_reconcile(&cli, &pr_url).await
        }
        HeraldCommand::Dispatch(args) => {
            let event = load_event(&cli, &args.event_path)?;
            let route = route_for_event(&event);
            info!(
                action = %event.action,
                reviewer = ?event.reviewer,
                route = route.as_str(),
                number = event.pull_request.number,
                "dispatching pull request event"
            );
            match route {
                EventRoute::Announce => run_announce(&cli, &event.pull_request).await,
                EventRoute::Reconcile => run_reconcile(&cli, &event.pull_request.url).await,
                EventRoute::Ignore => Ok(()),
            }
        }
    }
}

async fn run_announce(cli: &Cli, pull_request: &PullRequestSummary) -> Result<()> {
    let token = cli
        .github_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow!("--github-token (or GITHUB_TOKEN) is required to announce"))?;
    let provider = GithubApiClient::new(
        &github_settings(cli),
        token,
        pull_request.repo.clone(),
    )?;
    let options = announcement_options(cli)?;
    let session = open_slack_session(&session_config(cli)).await?;

    match maybe_announce(pull_request, &session, &provider, &options).await? {
        AnnounceOutcome::Skipped(reason) => {
            info!(number = pull_request.number, ?reason, "announcement skipped");
        }
        AnnounceOutcome::Ran(report) => {
            let posted = match &report.post {
                PostDecision::Posted { ts } => Some(ts.as_str()),
                PostDecision::Withheld(_) => None,
            };
            info!(
                number = pull_request.number,
                assignee = ?report.issue_state.assignee,
                milestone = ?report.issue_state.milestone,
                posted_ts = posted.unwrap_or("-"),
                "announce run complete"
            );
        }
    }
    Ok(())
}

async fn run_reconcile(cli: &Cli, pr_url: &str) -> Result<()> {
    let session = open_slack_session(&session_config(cli)).await?;
    let report = reconcile_stale(pr_url, &session).await?;
    info!(
        pr_url,
        deleted = report.deleted.len(),
        halted = ?report.halted,
        "reconcile run complete"
    );
    Ok(())
}

fn load_event(cli: &Cli, path: &Path) -> Result<PullRequestEvent> {
    let fallback_repo = parse_optional_repo(cli.github_repo.as_deref())
        .context("invalid --github-repo")?;
    load_pull_request_event(path, fallback_repo.as_ref())
}

fn reconcile_target(cli: &Cli, args: &ReconcileArgs) -> Result<String> {
    if let Some(pr_url) = args
        .pr_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        return Ok(pr_url.to_string());
    }
    let path = args
        .event_path
        .as_deref()
        .ok_or_else(|| anyhow!("reconcile needs --pr-url or --event-path"))?;
    Ok(load_event(cli, path)?.pull_request.url)
}

fn parse_optional_repo(raw: Option<&str>) -> Result<Option<RepoRef>> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(RepoRef::parse)
        .transpose()
}

fn slack_settings(cli: &Cli) -> SlackClientSettings {
    SlackClientSettings {
        api_base: cli.slack_api_base.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
    }
}

fn github_settings(cli: &Cli) -> GithubClientSettings {
    GithubClientSettings {
        api_base: cli.github_api_base.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
    }
}

fn session_config(cli: &Cli) -> SlackSessionConfig {
    SlackSessionConfig {
        settings: slack_settings(cli),
        bot_token: cli.slack_bot_token.clone(),
        elevated_token: cli.slack_user_token.clone(),
        channel_name: cli.slack_channel.clone(),
    }
}

fn announcement_options(cli: &Cli) -> Result<AnnouncementOptions> {
    Ok(AnnouncementOptions {
        default_repo: parse_optional_repo(cli.default_repo.as_deref())
            .context("invalid --default-repo")?,
        mention: cli.mention.clone(),
    })
}
