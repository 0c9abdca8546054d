//! Slack text and block rendering for review announcements.

use herald_github::{PullRequestSummary, RepoRef};
use herald_slack::OutgoingMessage;
use serde_json::{json, Value};

const EDITOR_HOST: &str = "github.dev";

/// Operator-level knobs for announcement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnouncementOptions {
    /// Repository announcements omit the ` in owner/repo` suffix for.
    pub default_repo: Option<RepoRef>,
    /// Prefix such as `@reviewers`; resolved into a real mention by Slack.
    pub mention: Option<String>,
}

pub fn strip_backticks(title: &str) -> String {
    title.replace('`', "").trim().to_string()
}

pub fn diff_summary(additions: u64, deletions: u64, changed_files: u64) -> String {
    let noun = if changed_files == 1 { "file" } else { "files" };
    format!("+{additions} -{deletions}, {changed_files} {noun}")
}

/// Swap the host of `url` for the browser editor host; path and query are kept.
pub fn editor_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let path = rest.find('/').map_or("", |index| &rest[index..]);
            format!("{scheme}://{EDITOR_HOST}{path}")
        }
        None => url.to_string(),
    }
}

pub fn render_announcement(
    pull_request: &PullRequestSummary,
    options: &AnnouncementOptions,
) -> OutgoingMessage {
    let mut text = String::new();
    if let Some(mention) = options
        .mention
        .as_deref()
        .map(str::trim)
        .filter(|mention| !mention.is_empty())
    {
        text.push_str(mention);
        text.push(' ');
    }
    text.push_str(&format!(
        "{} requests review of <{}|#{}>",
        pull_request.author, pull_request.url, pull_request.number
    ));
    let title = strip_backticks(&pull_request.title);
    if !title.is_empty() {
        text.push_str(&format!(": `{title}`"));
    }
    text.push_str(&format!(
        " ({})",
        diff_summary(
            pull_request.additions,
            pull_request.deletions,
            pull_request.changed_files
        )
    ));
    let is_default_repo = options
        .default_repo
        .as_ref()
        .is_some_and(|default_repo| default_repo.same_repository(&pull_request.repo));
    if !is_default_repo {
        text.push_str(&format!(" in {}", pull_request.repo.full_name()));
    }

    let blocks = vec![
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": text},
        }),
        json!({
            "type": "actions",
            "elements": [
                link_button("open_editor", "Open in github.dev", &editor_url(&pull_request.url)),
                link_button("open_pull_request", "View pull request", &pull_request.url),
            ],
        }),
    ];
    OutgoingMessage { text, blocks }
}

fn link_button(action_id: &str, label: &str, url: &str) -> Value {
    json!({
        "type": "button",
        "action_id": action_id,
        "text": {"type": "plain_text", "text": label},
        "url": url,
    })
}
