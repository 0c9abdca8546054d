//! GitHub side of herald: REST client for issue, milestone and review state,
//! plus the pull-request snapshot read from a workflow event payload.

pub mod github_api_client;
pub mod github_types;
pub mod pull_request_event;

pub use github_api_client::{GithubApiClient, GithubClientSettings};
pub use github_types::{
    select_current_milestone, IssueSnapshot, Milestone, PullRequestReview, RepoRef,
    ReviewRequests,
};
pub use pull_request_event::{
    load_pull_request_event, parse_pull_request_event, PullRequestEvent, PullRequestSummary,
};
