//! Assignee and milestone upkeep for an announced pull request.

use herald_github::{IssueSnapshot, Milestone, PullRequestSummary};
use tracing::{debug, info};

use crate::error::HeraldError;
use crate::pull_request_provider::PullRequestProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeUpdate {
    Assigned(String),
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilestoneUpdate {
    Set(Milestone),
    AlreadySet,
    NoCurrentMilestone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueStateOutcome {
    pub assignee: AssigneeUpdate,
    pub milestone: MilestoneUpdate,
}

/// Assign the author to an unassigned pull request and put it in the current
/// milestone when it has none.
///
/// Both updates run concurrently and to completion. When either fails the
/// first error is returned; the other update is not undone.
pub async fn apply_issue_state(
    provider: &dyn PullRequestProvider,
    pull_request: &PullRequestSummary,
) -> Result<IssueStateOutcome, HeraldError> {
    let issue = provider
        .get_issue(pull_request.number)
        .await
        .map_err(HeraldError::provider("get issue"))?;

    let (assignee, milestone) = tokio::join!(
        ensure_assignee(provider, pull_request, &issue),
        ensure_milestone(provider, pull_request.number, &issue),
    );
    Ok(IssueStateOutcome {
        assignee: assignee?,
        milestone: milestone?,
    })
}

async fn ensure_assignee(
    provider: &dyn PullRequestProvider,
    pull_request: &PullRequestSummary,
    issue: &IssueSnapshot,
) -> Result<AssigneeUpdate, HeraldError> {
    if issue.is_assigned() {
        debug!(number = issue.number, assignees = ?issue.assignees, "issue already assigned");
        return Ok(AssigneeUpdate::Unchanged);
    }
    let login = issue
        .author
        .clone()
        .unwrap_or_else(|| pull_request.author.clone());
    provider
        .add_assignee(issue.number, &login)
        .await
        .map_err(HeraldError::provider("add assignee"))?;
    info!(number = issue.number, assignee = %login, "assigned pull request author");
    Ok(AssigneeUpdate::Assigned(login))
}

async fn ensure_milestone(
    provider: &dyn PullRequestProvider,
    number: u64,
    issue: &IssueSnapshot,
) -> Result<MilestoneUpdate, HeraldError> {
    if let Some(existing) = &issue.milestone {
        debug!(number, milestone = %existing.title, "milestone already set");
        return Ok(MilestoneUpdate::AlreadySet);
    }
    let Some(current) = provider
        .current_milestone()
        .await
        .map_err(HeraldError::provider("find current milestone"))?
    else {
        debug!(number, "repository has no open milestone");
        return Ok(MilestoneUpdate::NoCurrentMilestone);
    };
    provider
        .set_milestone(number, &current)
        .await
        .map_err(HeraldError::provider("set milestone"))?;
    info!(number, milestone = %current.title, "set milestone");
    Ok(MilestoneUpdate::Set(current))
}
