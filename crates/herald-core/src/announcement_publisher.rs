//! Decides whether a pull request gets a review announcement and posts it.
//!
//! A run is gated in order on draft state and on the author's write access.
//! Past the gate, issue upkeep and the announcement run concurrently; the
//! announcement is withheld once someone other than the author has reviewed
//! or a review has been requested. There is no record of earlier posts, so
//! the review state is what keeps repeated runs from posting twice.

use herald_github::{PullRequestReview, PullRequestSummary, ReviewRequests};
use tracing::{debug, info};

use crate::announcement_render::{render_announcement, AnnouncementOptions};
use crate::chat_session::ChatSession;
use crate::error::HeraldError;
use crate::issue_state::{apply_issue_state, IssueStateOutcome};
use crate::pull_request_provider::PullRequestProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Draft,
    AuthorNotTrusted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewState {
    pub has_non_author_review: bool,
    pub has_pending_review_request: bool,
}

impl ReviewState {
    pub fn from_parts(
        author: &str,
        reviews: &[PullRequestReview],
        requests: &ReviewRequests,
    ) -> Self {
        let has_non_author_review = reviews.iter().any(|review| {
            review
                .reviewer
                .as_deref()
                .map_or(true, |reviewer| !reviewer.eq_ignore_ascii_case(author))
        });
        Self {
            has_non_author_review,
            has_pending_review_request: !requests.is_empty(),
        }
    }

    /// True once the pull request no longer needs to be advertised.
    pub fn claimed(&self) -> bool {
        self.has_non_author_review || self.has_pending_review_request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostDecision {
    Posted { ts: String },
    Withheld(ReviewState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceReport {
    pub issue_state: IssueStateOutcome,
    pub post: PostDecision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    Skipped(SkipReason),
    Ran(AnnounceReport),
}

/// Fetch reviews and review requests together and summarise them.
pub async fn review_state(
    provider: &dyn PullRequestProvider,
    pull_request: &PullRequestSummary,
) -> Result<ReviewState, HeraldError> {
    let (reviews, requests) = tokio::join!(
        provider.list_reviews(pull_request.number),
        provider.list_review_requests(pull_request.number),
    );
    let reviews = reviews.map_err(HeraldError::provider("list reviews"))?;
    let requests = requests.map_err(HeraldError::provider("list review requests"))?;
    Ok(ReviewState::from_parts(
        &pull_request.author,
        &reviews,
        &requests,
    ))
}

pub async fn maybe_announce(
    pull_request: &PullRequestSummary,
    session: &ChatSession,
    provider: &dyn PullRequestProvider,
    options: &AnnouncementOptions,
) -> Result<AnnounceOutcome, HeraldError> {
    if pull_request.draft {
        info!(number = pull_request.number, "skipping draft pull request");
        return Ok(AnnounceOutcome::Skipped(SkipReason::Draft));
    }
    let trusted = provider
        .has_write_access(&pull_request.author)
        .await
        .map_err(HeraldError::provider("check author permission"))?;
    if !trusted {
        info!(
            number = pull_request.number,
            author = %pull_request.author,
            "skipping pull request from author without write access"
        );
        return Ok(AnnounceOutcome::Skipped(SkipReason::AuthorNotTrusted));
    }

    let (issue_state, post) = tokio::join!(
        apply_issue_state(provider, pull_request),
        announce_if_unclaimed(pull_request, session, provider, options),
    );
    Ok(AnnounceOutcome::Ran(AnnounceReport {
        issue_state: issue_state?,
        post: post?,
    }))
}

async fn announce_if_unclaimed(
    pull_request: &PullRequestSummary,
    session: &ChatSession,
    provider: &dyn PullRequestProvider,
    options: &AnnouncementOptions,
) -> Result<PostDecision, HeraldError> {
    let state = review_state(provider, pull_request).await?;
    if state.claimed() {
        info!(
            number = pull_request.number,
            has_non_author_review = state.has_non_author_review,
            has_pending_review_request = state.has_pending_review_request,
            "review already claimed; not announcing"
        );
        return Ok(PostDecision::Withheld(state));
    }

    let message = render_announcement(pull_request, options);
    debug!(number = pull_request.number, text = %message.text, "rendered announcement");
    let channel = &session.channel().id;
    let posted = session
        .client()
        .post_message(channel, &message)
        .await
        .map_err(|error| HeraldError::ChatPost {
            channel: channel.clone(),
            source: error.into(),
        })?;
    info!(
        number = pull_request.number,
        channel = %posted.channel,
        ts = %posted.ts,
        "posted review announcement"
    );
    Ok(PostDecision::Posted { ts: posted.ts })
}
