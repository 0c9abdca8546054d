//! Announce and reconcile runs against mocked Slack and GitHub HTTP APIs.

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;

use herald_core::{
    maybe_announce, open_slack_session, reconcile_stale, AnnounceOutcome, AnnouncementOptions,
    AssigneeUpdate, MilestoneUpdate, PostDecision, SlackSessionConfig,
};
use herald_github::{GithubApiClient, GithubClientSettings, PullRequestSummary, RepoRef};
use herald_slack::SlackClientSettings;

const PR_URL: &str = "https://github.com/acme/widgets/pull/42";

fn session_config(slack: &MockServer, elevated_token: Option<&str>) -> SlackSessionConfig {
    SlackSessionConfig {
        settings: SlackClientSettings {
            api_base: slack.base_url(),
            request_timeout_ms: 2_000,
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        },
        bot_token: "xoxb-bot".to_string(),
        elevated_token: elevated_token.map(ToOwned::to_owned),
        channel_name: "#reviews".to_string(),
    }
}

fn github_client(github: &MockServer) -> GithubApiClient {
    GithubApiClient::new(
        &GithubClientSettings {
            api_base: github.base_url(),
            request_timeout_ms: 2_000,
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        },
        "ghp-test",
        RepoRef::parse("acme/widgets").expect("repo"),
    )
    .expect("github client")
}

fn pull_request() -> PullRequestSummary {
    PullRequestSummary {
        repo: RepoRef::parse("acme/widgets").expect("repo"),
        number: 42,
        author: "alice".to_string(),
        title: "`fix: crash`".to_string(),
        url: PR_URL.to_string(),
        draft: false,
        additions: 5,
        deletions: 0,
        changed_files: 1,
    }
}

fn mock_channel_listing(slack: &MockServer) -> Mock<'_> {
    slack.mock(|when, then| {
        when.method(GET)
            .path("/conversations.list")
            .header("authorization", "Bearer xoxb-bot");
        then.status(200).json_body(json!({
            "ok": true,
            "channels": [
                {"id": "C0", "name": "general", "is_member": true},
                {"id": "C1", "name": "reviews", "is_member": true}
            ],
            "response_metadata": {"next_cursor": ""}
        }));
    })
}

fn mock_trusted_unassigned_issue(github: &MockServer) {
    github.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/widgets/collaborators/alice/permission");
        then.status(200).json_body(json!({"permission": "write"}));
    });
    github.mock(|when, then| {
        when.method(GET).path("/repos/acme/widgets/issues/42");
        then.status(200).json_body(json!({
            "number": 42,
            "user": {"login": "alice"},
            "assignees": [],
            "milestone": null
        }));
    });
    github.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/widgets/milestones")
            .query_param("state", "open");
        then.status(200).json_body(json!([
            {"number": 1, "title": "2020.01", "due_on": "2020-01-31T08:00:00Z"},
            {"number": 4, "title": "2098.11", "due_on": "2098-11-30T08:00:00Z"},
            {"number": 3, "title": "2098.10", "due_on": "2098-10-30T07:00:00Z"}
        ]));
    });
    github.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/widgets/pulls/42/requested_reviewers");
        then.status(200).json_body(json!({"users": [], "teams": []}));
    });
}

#[tokio::test]
async fn integration_announce_posts_and_updates_issue_for_unclaimed_pull_request() {
    let slack = MockServer::start();
    let github = MockServer::start();
    let listing = mock_channel_listing(&slack);
    mock_trusted_unassigned_issue(&github);
    github.mock(|when, then| {
        when.method(GET).path("/repos/acme/widgets/pulls/42/reviews");
        then.status(200).json_body(json!([]));
    });
    let assign = github.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/42/assignees")
            .json_body_includes(json!({"assignees": ["alice"]}).to_string());
        then.status(201).json_body(json!({"number": 42}));
    });
    let set_milestone = github.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/acme/widgets/issues/42")
            .json_body_includes(json!({"milestone": 3}).to_string());
        then.status(200).json_body(json!({"number": 42}));
    });
    let post = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .json_body_includes(
                json!({
                    "channel": "C1",
                    "link_names": true,
                    "text": "@reviewers alice requests review of <https://github.com/acme/widgets/pull/42|#42>: `fix: crash` (+5 -0, 1 file)"
                })
                .to_string(),
            );
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "1700.01"}));
    });

    let session = open_slack_session(&session_config(&slack, None))
        .await
        .expect("session");
    let options = AnnouncementOptions {
        default_repo: Some(RepoRef::parse("acme/widgets").expect("repo")),
        mention: Some("@reviewers".to_string()),
    };
    let outcome = maybe_announce(&pull_request(), &session, &github_client(&github), &options)
        .await
        .expect("announce");

    let report = match outcome {
        AnnounceOutcome::Ran(report) => report,
        other => panic!("expected announce run, got {other:?}"),
    };
    assert_eq!(
        report.post,
        PostDecision::Posted {
            ts: "1700.01".to_string()
        }
    );
    assert_eq!(
        report.issue_state.assignee,
        AssigneeUpdate::Assigned("alice".to_string())
    );
    assert!(matches!(
        report.issue_state.milestone,
        MilestoneUpdate::Set(ref milestone) if milestone.number == 3
    ));
    listing.assert();
    assign.assert();
    set_milestone.assert();
    post.assert();
}

#[tokio::test]
async fn integration_announce_withholds_post_once_someone_else_reviewed() {
    let slack = MockServer::start();
    let github = MockServer::start();
    mock_channel_listing(&slack);
    mock_trusted_unassigned_issue(&github);
    github.mock(|when, then| {
        when.method(GET).path("/repos/acme/widgets/pulls/42/reviews");
        then.status(200).json_body(json!([
            {"user": {"login": "alice"}, "state": "COMMENTED"},
            {"user": {"login": "bob"}, "state": "CHANGES_REQUESTED"}
        ]));
    });
    let assign = github.mock(|when, then| {
        when.method(POST).path("/repos/acme/widgets/issues/42/assignees");
        then.status(201).json_body(json!({"number": 42}));
    });
    let set_milestone = github.mock(|when, then| {
        when.method(PATCH).path("/repos/acme/widgets/issues/42");
        then.status(200).json_body(json!({"number": 42}));
    });
    let post = slack.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "1700.01"}));
    });

    let session = open_slack_session(&session_config(&slack, None))
        .await
        .expect("session");
    let outcome = maybe_announce(
        &pull_request(),
        &session,
        &github_client(&github),
        &AnnouncementOptions::default(),
    )
    .await
    .expect("announce");

    let report = match outcome {
        AnnounceOutcome::Ran(report) => report,
        other => panic!("expected announce run, got {other:?}"),
    };
    assert!(matches!(report.post, PostDecision::Withheld(_)));
    assign.assert();
    set_milestone.assert();
    assert_eq!(post.calls(), 0);
}

#[tokio::test]
async fn integration_reconcile_deletes_announcement_thread_with_elevated_token() {
    let slack = MockServer::start();
    mock_channel_listing(&slack);
    slack.mock(|when, then| {
        when.method(GET)
            .path("/conversations.history")
            .header("authorization", "Bearer xoxb-bot")
            .query_param("channel", "C1")
            .query_param("limit", "20");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"ts": "30.0", "text": "unrelated", "reactions": [{"name": "thumbsup", "count": 1}]},
                {"ts": "20.0", "text": format!("alice requests review of <{PR_URL}|#42>"), "reply_count": 2},
                {"ts": "10.0", "text": "see https://github.com/acme/widgets/pull/421"}
            ]
        }));
    });
    slack.mock(|when, then| {
        when.method(GET)
            .path("/conversations.replies")
            .query_param("channel", "C1")
            .query_param("ts", "20.0");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"ts": "20.0", "text": format!("alice requests review of <{PR_URL}|#42>"), "reply_count": 2},
                {"ts": "20.1", "text": "looking"},
                {"ts": "20.2", "text": "approved"}
            ]
        }));
    });
    let deletes = ["20.0", "20.1", "20.2"].map(|ts| {
        slack.mock(move |when, then| {
            when.method(POST)
                .path("/chat.delete")
                .header("authorization", "Bearer xoxp-admin")
                .json_body_includes(json!({"channel": "C1", "ts": ts, "as_user": true}).to_string());
            then.status(200).json_body(json!({"ok": true}));
        })
    });

    let session = open_slack_session(&session_config(&slack, Some("xoxp-admin")))
        .await
        .expect("session");
    let report = reconcile_stale(PR_URL, &session).await.expect("reconcile");

    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, vec!["20.0", "20.1", "20.2"]);
    assert!(report.halted.is_none());
    for delete in &deletes {
        delete.assert();
    }
}

#[tokio::test]
async fn integration_reconcile_stops_at_first_rejected_delete() {
    let slack = MockServer::start();
    mock_channel_listing(&slack);
    slack.mock(|when, then| {
        when.method(GET).path("/conversations.history");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"ts": "3.0", "text": format!("ping {PR_URL}")},
                {"ts": "2.0", "text": format!("human wrote {PR_URL}")},
                {"ts": "1.0", "text": format!("bot wrote {PR_URL}")}
            ]
        }));
    });
    let first = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.delete")
            .json_body_includes(json!({"ts": "3.0"}).to_string());
        then.status(200).json_body(json!({"ok": true}));
    });
    let rejected = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.delete")
            .json_body_includes(json!({"ts": "2.0"}).to_string());
        then.status(200)
            .json_body(json!({"ok": false, "error": "cant_delete_message"}));
    });
    let never = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.delete")
            .json_body_includes(json!({"ts": "1.0"}).to_string());
        then.status(200).json_body(json!({"ok": true}));
    });

    let session = open_slack_session(&session_config(&slack, None))
        .await
        .expect("session");
    let report = reconcile_stale(PR_URL, &session)
        .await
        .expect("halting is not an error");

    assert_eq!(report.deleted, vec!["3.0"]);
    assert_eq!(report.halted.as_deref(), Some("2.0"));
    first.assert();
    rejected.assert();
    assert_eq!(never.calls(), 0);
}
