//! Pull-request snapshot extracted from a workflow event payload.
//!
//! The payload is the JSON document GitHub Actions writes to
//! `GITHUB_EVENT_PATH` for `pull_request`, `pull_request_target` and
//! `pull_request_review` events. Review events carry a trimmed pull request
//! object without diff statistics; those default to zero.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::github_types::{GithubUserRecord, RepoRef};

#[derive(Debug, Clone, Deserialize)]
struct EventRecord {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    pull_request: Option<PullRequestRecord>,
    #[serde(default)]
    repository: Option<RepositoryRecord>,
    #[serde(default)]
    review: Option<ReviewRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReviewRecord {
    #[serde(default)]
    user: Option<GithubUserRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct RepositoryRecord {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestRecord {
    number: u64,
    #[serde(default)]
    user: Option<GithubUserRecord>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    draft: Option<bool>,
    #[serde(default)]
    additions: Option<u64>,
    #[serde(default)]
    deletions: Option<u64>,
    #[serde(default)]
    changed_files: Option<u64>,
}

/// Immutable per-run snapshot of the pull request being announced or cleaned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub repo: RepoRef,
    pub number: u64,
    /// Login of the pull-request author; also the name shown in announcements.
    pub author: String,
    pub title: String,
    pub url: String,
    pub draft: bool,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequestSummary,
    /// Login of the review's author on `pull_request_review` events.
    pub reviewer: Option<String>,
}

impl PullRequestEvent {
    /// Whether this is a review the pull-request author left on their own change.
    pub fn is_author_review(&self) -> bool {
        self.reviewer
            .as_deref()
            .is_some_and(|reviewer| reviewer.eq_ignore_ascii_case(&self.pull_request.author))
    }
}

pub fn load_pull_request_event(
    path: &Path,
    fallback_repo: Option<&RepoRef>,
) -> Result<PullRequestEvent> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event payload {}", path.display()))?;
    parse_pull_request_event(&raw, fallback_repo)
        .with_context(|| format!("invalid event payload {}", path.display()))
}

/// Parse an event payload; the payload's repository wins over `fallback_repo`.
pub fn parse_pull_request_event(
    raw: &str,
    fallback_repo: Option<&RepoRef>,
) -> Result<PullRequestEvent> {
    let record: EventRecord =
        serde_json::from_str(raw).context("failed to decode event payload json")?;
    let pull_request = record
        .pull_request
        .ok_or_else(|| anyhow!("event payload has no pull_request object"))?;
    let repo = match record
        .repository
        .and_then(|repository| repository.full_name)
        .filter(|name| !name.trim().is_empty())
    {
        Some(full_name) => RepoRef::parse(&full_name)?,
        None => fallback_repo
            .cloned()
            .ok_or_else(|| anyhow!("event payload names no repository and none is configured"))?,
    };

    let author = pull_request
        .user
        .and_then(|user| user.login)
        .map(|login| login.trim().to_string())
        .filter(|login| !login.is_empty())
        .ok_or_else(|| anyhow!("pull request #{} has no author login", pull_request.number))?;
    let url = pull_request
        .html_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| anyhow!("pull request #{} has no html_url", pull_request.number))?;
    if !url.starts_with("https://") && !url.starts_with("http://") {
        bail!("pull request #{} has a non-http url '{url}'", pull_request.number);
    }

    let reviewer = record
        .review
        .and_then(|review| review.user)
        .and_then(|user| user.login)
        .map(|login| login.trim().to_string())
        .filter(|login| !login.is_empty());

    Ok(PullRequestEvent {
        action: record.action.unwrap_or_default().trim().to_string(),
        reviewer,
        pull_request: PullRequestSummary {
            repo,
            number: pull_request.number,
            author,
            title: pull_request.title.unwrap_or_default(),
            url,
            draft: pull_request.draft.unwrap_or(false),
            additions: pull_request.additions.unwrap_or(0),
            deletions: pull_request.deletions.unwrap_or(0),
            changed_files: pull_request.changed_files.unwrap_or(0),
        },
    })
}
