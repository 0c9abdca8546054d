use anyhow::{Context, Result};
use herald_http::{JsonTransport, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::github_types::{
    permission_grants_write, GithubIssueRecord, GithubMilestoneRecord, GithubPermissionRecord,
    GithubRequestedReviewersRecord, GithubReviewRecord, IssueSnapshot, Milestone,
    PullRequestReview, RepoRef, ReviewRequests,
};

const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct GithubClientSettings {
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

/// REST client bound to a single repository.
#[derive(Clone)]
pub struct GithubApiClient {
    transport: JsonTransport,
    api_base: String,
    repo: RepoRef,
}

impl GithubApiClient {
    pub fn new(settings: &GithubClientSettings, token: &str, repo: RepoRef) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("herald-github"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .context("invalid github authorization header")?,
        );
        let transport = JsonTransport::new(
            "github",
            headers,
            settings.request_timeout_ms,
            RetryPolicy::new(settings.retry_max_attempts, settings.retry_base_delay_ms),
        )?;
        Ok(Self {
            transport,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, suffix
        )
    }

    pub async fn get_issue(&self, number: u64) -> Result<IssueSnapshot> {
        let url = self.repo_url(&format!("issues/{number}"));
        let record: GithubIssueRecord = self
            .request_json("get issue", || self.http().get(&url))
            .await?;
        Ok(IssueSnapshot::from_record(record))
    }

    pub async fn collaborator_permission(&self, login: &str) -> Result<Option<String>> {
        let url = self.repo_url(&format!("collaborators/{login}/permission"));
        let record: GithubPermissionRecord = self
            .request_json("get collaborator permission", || self.http().get(&url))
            .await?;
        Ok(record.permission)
    }

    pub async fn has_write_access(&self, login: &str) -> Result<bool> {
        let permission = self.collaborator_permission(login).await?;
        Ok(permission_grants_write(permission.as_deref()))
    }

    pub async fn add_assignees(&self, number: u64, logins: &[&str]) -> Result<()> {
        let url = self.repo_url(&format!("issues/{number}/assignees"));
        let payload = json!({ "assignees": logins });
        let _: serde_json::Value = self
            .request_json("add assignees", || self.http().post(&url).json(&payload))
            .await?;
        Ok(())
    }

    pub async fn list_open_milestones(&self) -> Result<Vec<Milestone>> {
        let url = self.repo_url("milestones");
        let records: Vec<GithubMilestoneRecord> = self
            .request_paginated("list milestones", &url, &[("state", "open")])
            .await?;
        Ok(records.into_iter().map(Milestone::from).collect())
    }

    pub async fn set_milestone(&self, number: u64, milestone_number: u64) -> Result<()> {
        let url = self.repo_url(&format!("issues/{number}"));
        let payload = json!({ "milestone": milestone_number });
        let _: serde_json::Value = self
            .request_json("set milestone", || self.http().patch(&url).json(&payload))
            .await?;
        Ok(())
    }

    pub async fn list_reviews(&self, number: u64) -> Result<Vec<PullRequestReview>> {
        let url = self.repo_url(&format!("pulls/{number}/reviews"));
        let records: Vec<GithubReviewRecord> = self
            .request_paginated("list reviews", &url, &[])
            .await?;
        Ok(records.into_iter().map(PullRequestReview::from).collect())
    }

    pub async fn list_review_requests(&self, number: u64) -> Result<ReviewRequests> {
        let url = self.repo_url(&format!("pulls/{number}/requested_reviewers"));
        let record: GithubRequestedReviewersRecord = self
            .request_json("list review requests", || self.http().get(&url))
            .await?;
        Ok(ReviewRequests::from_record(record))
    }

    async fn request_paginated<T>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        let per_page = PAGE_SIZE.to_string();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<T> = self
                .request_json(operation, || {
                    self.http().get(url).query(query).query(&[
                        ("per_page", per_page.as_str()),
                        ("page", page_value.as_str()),
                    ])
                })
                .await?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    fn http(&self) -> &reqwest::Client {
        self.transport.http()
    }

    async fn request_json<T, F>(&self, operation: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        self.transport.send_json(operation, build).await
    }
}
