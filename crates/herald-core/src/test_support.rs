//! In-memory collaborators for exercising the flows without HTTP.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use herald_github::{
    IssueSnapshot, Milestone, PullRequestReview, PullRequestSummary, RepoRef, ReviewRequests,
};
use herald_slack::{
    ChannelMembership, ChannelPage, ChatMessage, MessageSubtype, OutgoingMessage, Reaction,
    SlackPostedMessage,
};

use crate::channel_resolver::ChannelHandle;
use crate::chat_client::ChatClient;
use crate::chat_session::ChatSession;
use crate::pull_request_provider::PullRequestProvider;

pub(crate) const PR_URL: &str = "https://github.com/acme/widgets/pull/42";

pub(crate) fn sample_pull_request() -> PullRequestSummary {
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

pub(crate) fn message(ts: &str, text: &str) -> ChatMessage {
    ChatMessage {
        ts: ts.to_string(),
        text: text.to_string(),
        subtype: None,
        reply_count: 0,
        reactions: Vec::new(),
    }
}

pub(crate) fn with_replies(mut message: ChatMessage, reply_count: u64) -> ChatMessage {
    message.reply_count = reply_count;
    message
}

pub(crate) fn with_subtype(mut message: ChatMessage, subtype: MessageSubtype) -> ChatMessage {
    message.subtype = Some(subtype);
    message
}

pub(crate) fn with_reaction(mut message: ChatMessage, name: &str, count: u64) -> ChatMessage {
    message.reactions.push(Reaction {
        name: name.to_string(),
        count,
    });
    message
}

pub(crate) fn membership(id: &str, name: &str, is_member: bool) -> ChannelMembership {
    ChannelMembership {
        id: id.to_string(),
        name: name.to_string(),
        is_member,
    }
}

pub(crate) fn page(channels: Vec<ChannelMembership>, next_cursor: Option<&str>) -> ChannelPage {
    ChannelPage {
        channels,
        next_cursor: next_cursor.map(ToOwned::to_owned),
    }
}

pub(crate) fn session(
    client: Arc<FakeChatClient>,
    elevated: Option<Arc<FakeChatClient>>,
) -> ChatSession {
    ChatSession::from_parts(
        ChannelHandle {
            id: "C1".to_string(),
            name: "reviews".to_string(),
        },
        client,
        elevated.map(|client| client as Arc<dyn ChatClient>),
    )
}

pub(crate) struct FakeChatClient {
    actor: &'static str,
    pages: Mutex<VecDeque<Result<ChannelPage, String>>>,
    history: Result<Vec<ChatMessage>, String>,
    replies: HashMap<String, Result<Vec<ChatMessage>, String>>,
    failing_deletes: HashSet<String>,
    fail_post: bool,
    pub(crate) page_cursors: Mutex<Vec<Option<String>>>,
    pub(crate) history_limits: Mutex<Vec<usize>>,
    pub(crate) reply_requests: Mutex<Vec<String>>,
    pub(crate) delete_attempts: Mutex<Vec<String>>,
    pub(crate) deleted: Mutex<Vec<String>>,
    pub(crate) posted: Mutex<Vec<(String, OutgoingMessage)>>,
}

impl FakeChatClient {
    pub(crate) fn new(actor: &'static str) -> Self {
        Self {
            actor,
            pages: Mutex::new(VecDeque::new()),
            history: Ok(Vec::new()),
            replies: HashMap::new(),
            failing_deletes: HashSet::new(),
            fail_post: false,
            page_cursors: Mutex::new(Vec::new()),
            history_limits: Mutex::new(Vec::new()),
            reply_requests: Mutex::new(Vec::new()),
            delete_attempts: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_pages(self, pages: Vec<Result<ChannelPage, String>>) -> Self {
        *self.pages.lock().expect("pages lock") = pages.into();
        self
    }

    pub(crate) fn with_history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.history = Ok(messages);
        self
    }

    pub(crate) fn with_history_error(mut self, error: &str) -> Self {
        self.history = Err(error.to_string());
        self
    }

    pub(crate) fn with_thread(mut self, ts: &str, thread: Vec<ChatMessage>) -> Self {
        self.replies.insert(ts.to_string(), Ok(thread));
        self
    }

    pub(crate) fn with_thread_error(mut self, ts: &str, error: &str) -> Self {
        self.replies.insert(ts.to_string(), Err(error.to_string()));
        self
    }

    pub(crate) fn failing_delete(mut self, ts: &str) -> Self {
        self.failing_deletes.insert(ts.to_string());
        self
    }

    pub(crate) fn failing_post(mut self) -> Self {
        self.fail_post = true;
        self
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("deleted lock").clone()
    }

    pub(crate) fn posted(&self) -> Vec<(String, OutgoingMessage)> {
        self.posted.lock().expect("posted lock").clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    fn actor_label(&self) -> &'static str {
        self.actor
    }

    async fn list_channels_page(&self, cursor: Option<&str>) -> Result<ChannelPage> {
        self.page_cursors
            .lock()
            .expect("cursor lock")
            .push(cursor.map(ToOwned::to_owned));
        match self.pages.lock().expect("pages lock").pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(error)) => Err(anyhow!(error)),
            None => Err(anyhow!("no more scripted pages")),
        }
    }

    async fn recent_messages(&self, _channel: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        self.history_limits.lock().expect("limit lock").push(limit);
        self.history.clone().map_err(|error| anyhow!(error))
    }

    async fn thread_replies(&self, _channel: &str, ts: &str) -> Result<Vec<ChatMessage>> {
        self.reply_requests
            .lock()
            .expect("reply lock")
            .push(ts.to_string());
        match self.replies.get(ts) {
            Some(Ok(thread)) => Ok(thread.clone()),
            Some(Err(error)) => Err(anyhow!(error.clone())),
            None => Ok(Vec::new()),
        }
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &OutgoingMessage,
    ) -> Result<SlackPostedMessage> {
        if self.fail_post {
            return Err(anyhow!("slack chat.postMessage failed: channel_not_found"));
        }
        self.posted
            .lock()
            .expect("posted lock")
            .push((channel.to_string(), message.clone()));
        Ok(SlackPostedMessage {
            channel: channel.to_string(),
            ts: "100.1".to_string(),
        })
    }

    async fn delete_message(&self, _channel: &str, ts: &str) -> Result<()> {
        self.delete_attempts
            .lock()
            .expect("attempt lock")
            .push(ts.to_string());
        if self.failing_deletes.contains(ts) {
            return Err(anyhow!("slack chat.delete failed: cant_delete_message"));
        }
        self.deleted.lock().expect("deleted lock").push(ts.to_string());
        Ok(())
    }
}

pub(crate) struct FakeProvider {
    pub(crate) issue: IssueSnapshot,
    pub(crate) write_access: bool,
    pub(crate) current_milestone: Option<Milestone>,
    pub(crate) reviews: Vec<PullRequestReview>,
    pub(crate) review_requests: ReviewRequests,
    pub(crate) fail_operation: Option<&'static str>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self {
            issue: IssueSnapshot {
                number: 42,
                author: Some("alice".to_string()),
                assignees: Vec::new(),
                milestone: None,
            },
            write_access: true,
            current_milestone: None,
            reviews: Vec::new(),
            review_requests: ReviewRequests::default(),
            fail_operation: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, operation: &'static str, detail: Option<String>) -> Result<()> {
        let entry = match detail {
            Some(detail) => format!("{operation}:{detail}"),
            None => operation.to_string(),
        };
        self.calls.lock().expect("calls lock").push(entry);
        if self.fail_operation == Some(operation) {
            return Err(anyhow!("{operation} unavailable"));
        }
        Ok(())
    }
}

pub(crate) fn milestone(number: u64) -> Milestone {
    Milestone {
        number,
        title: format!("2026.{number}"),
        due_on: None,
    }
}

pub(crate) fn review_by(login: &str) -> PullRequestReview {
    PullRequestReview {
        reviewer: Some(login.to_string()),
        state: "COMMENTED".to_string(),
    }
}

#[async_trait]
impl PullRequestProvider for FakeProvider {
    async fn get_issue(&self, _number: u64) -> Result<IssueSnapshot> {
        self.record("get_issue", None)?;
        Ok(self.issue.clone())
    }

    async fn has_write_access(&self, login: &str) -> Result<bool> {
        self.record("has_write_access", Some(login.to_string()))?;
        Ok(self.write_access)
    }

    async fn add_assignee(&self, _number: u64, login: &str) -> Result<()> {
        self.record("add_assignee", Some(login.to_string()))
    }

    async fn current_milestone(&self) -> Result<Option<Milestone>> {
        self.record("current_milestone", None)?;
        Ok(self.current_milestone.clone())
    }

    async fn set_milestone(&self, _number: u64, milestone: &Milestone) -> Result<()> {
        self.record("set_milestone", Some(milestone.number.to_string()))
    }

    async fn list_reviews(&self, _number: u64) -> Result<Vec<PullRequestReview>> {
        self.record("list_reviews", None)?;
        Ok(self.reviews.clone())
    }

    async fn list_review_requests(&self, _number: u64) -> Result<ReviewRequests> {
        self.record("list_review_requests", None)?;
        Ok(self.review_requests.clone())
    }
}
