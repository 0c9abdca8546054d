//! Repository, issue, milestone and review shapes used by the announcement flow.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/repo");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// GitHub treats owner and repository names case-insensitively.
    pub fn same_repository(&self, other: &RepoRef) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubUserRecord {
    #[serde(default)]
    pub(crate) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubTeamRecord {
    #[serde(default)]
    pub(crate) slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubMilestoneRecord {
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) due_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubIssueRecord {
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) user: Option<GithubUserRecord>,
    #[serde(default)]
    pub(crate) assignee: Option<GithubUserRecord>,
    #[serde(default)]
    pub(crate) assignees: Vec<GithubUserRecord>,
    #[serde(default)]
    pub(crate) milestone: Option<GithubMilestoneRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubReviewRecord {
    #[serde(default)]
    pub(crate) user: Option<GithubUserRecord>,
    #[serde(default)]
    pub(crate) state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubRequestedReviewersRecord {
    #[serde(default)]
    pub(crate) users: Vec<GithubUserRecord>,
    #[serde(default)]
    pub(crate) teams: Vec<GithubTeamRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubPermissionRecord {
    #[serde(default)]
    pub(crate) permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
    pub due_on: Option<DateTime<Utc>>,
}

impl From<GithubMilestoneRecord> for Milestone {
    fn from(record: GithubMilestoneRecord) -> Self {
        Self {
            number: record.number,
            title: record.title.unwrap_or_default(),
            due_on: record.due_on,
        }
    }
}

/// Issue-level view of a pull request: who opened it and what is already set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSnapshot {
    pub number: u64,
    pub author: Option<String>,
    pub assignees: Vec<String>,
    pub milestone: Option<Milestone>,
}

impl IssueSnapshot {
    pub(crate) fn from_record(record: GithubIssueRecord) -> Self {
        let mut assignees = record
            .assignees
            .into_iter()
            .filter_map(|user| login_of(Some(user)))
            .collect::<Vec<_>>();
        if let Some(login) = login_of(record.assignee) {
            if !assignees.contains(&login) {
                assignees.push(login);
            }
        }
        Self {
            number: record.number,
            author: login_of(record.user),
            assignees,
            milestone: record.milestone.map(Milestone::from),
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.assignees.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestReview {
    /// `None` when the reviewer account has been deleted.
    pub reviewer: Option<String>,
    pub state: String,
}

impl From<GithubReviewRecord> for PullRequestReview {
    fn from(record: GithubReviewRecord) -> Self {
        Self {
            reviewer: login_of(record.user),
            state: record.state.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewRequests {
    pub users: Vec<String>,
    pub teams: Vec<String>,
}

impl ReviewRequests {
    pub(crate) fn from_record(record: GithubRequestedReviewersRecord) -> Self {
        Self {
            users: record
                .users
                .into_iter()
                .filter_map(|user| login_of(Some(user)))
                .collect(),
            teams: record
                .teams
                .into_iter()
                .filter_map(|team| team.slug.filter(|slug| !slug.trim().is_empty()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.teams.is_empty()
    }
}

pub(crate) fn permission_grants_write(permission: Option<&str>) -> bool {
    matches!(
        permission.map(str::trim),
        Some("admin") | Some("maintain") | Some("write")
    )
}

/// The open milestone due soonest after `now`. Overdue and undated milestones
/// are never current.
pub fn select_current_milestone(
    open_milestones: &[Milestone],
    now: DateTime<Utc>,
) -> Option<Milestone> {
    open_milestones
        .iter()
        .filter_map(|milestone| milestone.due_on.map(|due_on| (due_on, milestone)))
        .filter(|(due_on, _)| *due_on > now)
        .min_by_key(|(due_on, milestone)| (*due_on, milestone.number))
        .map(|(_, milestone)| milestone.clone())
}

fn login_of(user: Option<GithubUserRecord>) -> Option<String> {
    user.and_then(|user| user.login)
        .map(|login| login.trim().to_string())
        .filter(|login| !login.is_empty())
}
