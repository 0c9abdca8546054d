//! Review-announcement coordination between GitHub pull requests and a Slack channel.
//!
//! Two independent entry points share one [`ChatSession`]:
//! [`maybe_announce`] posts a review request for an eligible pull request and
//! tidies its issue state, while [`reconcile_stale`] removes announcements
//! (and their threads) that are no longer wanted. Nothing is persisted between
//! runs; every decision is re-derived from chat history and GitHub state.

pub mod announcement_publisher;
pub mod announcement_render;
pub mod channel_resolver;
pub mod chat_client;
pub mod chat_session;
pub mod error;
pub mod issue_state;
pub mod pull_request_provider;
pub mod stale_reconciler;

#[cfg(test)]
mod test_support;

pub use announcement_publisher::{
    maybe_announce, review_state, AnnounceOutcome, AnnounceReport, PostDecision, ReviewState,
    SkipReason,
};
pub use announcement_render::{
    diff_summary, editor_url, render_announcement, strip_backticks, AnnouncementOptions,
};
pub use channel_resolver::{member_channels, membership_pages, resolve_channel, ChannelHandle};
pub use chat_client::ChatClient;
pub use chat_session::{open_slack_session, ChatSession, SlackSessionConfig};
pub use error::HeraldError;
pub use issue_state::{apply_issue_state, AssigneeUpdate, IssueStateOutcome, MilestoneUpdate};
pub use pull_request_provider::PullRequestProvider;
pub use stale_reconciler::{
    classify_message, mentions_pull_request, reconcile_stale, CandidateReason,
    DeletionCandidateSet, ReconcileReport, APPROVAL_REACTION, HISTORY_LOOKBACK,
};
