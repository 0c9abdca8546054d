use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use herald_github::{
    select_current_milestone, GithubApiClient, IssueSnapshot, Milestone, PullRequestReview,
    ReviewRequests,
};

/// Issue and review state for pull requests in the configured repository.
#[async_trait]
pub trait PullRequestProvider: Send + Sync {
    async fn get_issue(&self, number: u64) -> Result<IssueSnapshot>;

    async fn has_write_access(&self, login: &str) -> Result<bool>;

    async fn add_assignee(&self, number: u64, login: &str) -> Result<()>;

    /// Milestone new pull requests should land in, if the repository has one.
    async fn current_milestone(&self) -> Result<Option<Milestone>>;

    async fn set_milestone(&self, number: u64, milestone: &Milestone) -> Result<()>;

    async fn list_reviews(&self, number: u64) -> Result<Vec<PullRequestReview>>;

    async fn list_review_requests(&self, number: u64) -> Result<ReviewRequests>;
}

#[async_trait]
impl PullRequestProvider for GithubApiClient {
    async fn get_issue(&self, number: u64) -> Result<IssueSnapshot> {
        GithubApiClient::get_issue(self, number).await
    }

    async fn has_write_access(&self, login: &str) -> Result<bool> {
        GithubApiClient::has_write_access(self, login).await
    }

    async fn add_assignee(&self, number: u64, login: &str) -> Result<()> {
        self.add_assignees(number, &[login]).await
    }

    async fn current_milestone(&self) -> Result<Option<Milestone>> {
        let open = self.list_open_milestones().await?;
        Ok(select_current_milestone(&open, Utc::now()))
    }

    async fn set_milestone(&self, number: u64, milestone: &Milestone) -> Result<()> {
        GithubApiClient::set_milestone(self, number, milestone.number).await
    }

    async fn list_reviews(&self, number: u64) -> Result<Vec<PullRequestReview>> {
        GithubApiClient::list_reviews(self, number).await
    }

    async fn list_review_requests(&self, number: u64) -> Result<ReviewRequests> {
        GithubApiClient::list_review_requests(self, number).await
    }
}
