//! Slack Web API client used for channel discovery, history scans, posting and deletion.

use anyhow::{anyhow, bail, Result};
use herald_http::{JsonTransport, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::slack_types::{
    ChannelPage, ChatMessage, OutgoingMessage, SlackConversationsListResponse,
    SlackMessagesResponse,
};

const CONVERSATIONS_PAGE_LIMIT: &str = "200";
const CONVERSATION_TYPES: &str = "public_channel,private_channel";

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackAckResponse {
    ok: bool,
    error: Option<String>,
}

/// Identity a client acts as. Bot tokens can only delete what the bot posted;
/// user tokens delete on behalf of a privileged workspace member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackActor {
    Bot,
    User,
}

impl SlackActor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::User => "user",
        }
    }
}

/// Transport settings shared by the bot and elevated clients.
#[derive(Debug, Clone)]
pub struct SlackClientSettings {
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Clone)]
pub struct SlackApiClient {
    transport: JsonTransport,
    api_base: String,
    token: String,
    actor: SlackActor,
}

impl SlackApiClient {
    pub fn new(settings: &SlackClientSettings, token: &str, actor: SlackActor) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            bail!("slack {} token must not be empty", actor.as_str());
        }
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("herald-slack"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let transport = JsonTransport::new(
            "slack",
            headers,
            settings.request_timeout_ms,
            RetryPolicy::new(settings.retry_max_attempts, settings.retry_base_delay_ms),
        )?;

        Ok(Self {
            transport,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            actor,
        })
    }

    pub fn actor(&self) -> SlackActor {
        self.actor
    }

    /// Fetch one page of public and private channels visible to the token.
    pub async fn list_conversations_page(&self, cursor: Option<&str>) -> Result<ChannelPage> {
        let cursor = cursor.map(str::trim).filter(|value| !value.is_empty());
        let response: SlackConversationsListResponse = self
            .transport
            .send_json("conversations.list", || {
                let mut request = self
                    .transport
                    .http()
                    .get(format!("{}/conversations.list", self.api_base))
                    .bearer_auth(&self.token)
                    .query(&[
                        ("types", CONVERSATION_TYPES),
                        ("exclude_archived", "true"),
                        ("limit", CONVERSATIONS_PAGE_LIMIT),
                    ]);
                if let Some(cursor) = cursor {
                    request = request.query(&[("cursor", cursor)]);
                }
                request
            })
            .await?;
        if !response.ok {
            bail!(
                "slack conversations.list failed: {}",
                slack_error_label(response.error)
            );
        }
        Ok(ChannelPage::from_response(response))
    }

    /// Most recent top-level messages in `channel`, newest first.
    pub async fn conversation_history(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>> {
        let limit = limit.max(1).to_string();
        let response: SlackMessagesResponse = self
            .transport
            .send_json("conversations.history", || {
                self.transport
                    .http()
                    .get(format!("{}/conversations.history", self.api_base))
                    .bearer_auth(&self.token)
                    .query(&[("channel", channel), ("limit", limit.as_str())])
            })
            .await?;
        if !response.ok {
            bail!(
                "slack conversations.history failed: {}",
                slack_error_label(response.error)
            );
        }
        Ok(ChatMessage::from_records(
            "conversations.history",
            response.messages,
        ))
    }

    /// Thread rooted at `ts`; the root itself is the first item.
    pub async fn conversation_replies(&self, channel: &str, ts: &str) -> Result<Vec<ChatMessage>> {
        let response: SlackMessagesResponse = self
            .transport
            .send_json("conversations.replies", || {
                self.transport
                    .http()
                    .get(format!("{}/conversations.replies", self.api_base))
                    .bearer_auth(&self.token)
                    .query(&[("channel", channel), ("ts", ts)])
            })
            .await?;
        if !response.ok {
            bail!(
                "slack conversations.replies failed: {}",
                slack_error_label(response.error)
            );
        }
        Ok(ChatMessage::from_records(
            "conversations.replies",
            response.messages,
        ))
    }

    /// Post with `link_names` so plain `@user` / `@group` text becomes a mention.
    pub async fn post_message(
        &self,
        channel: &str,
        message: &OutgoingMessage,
    ) -> Result<SlackPostedMessage> {
        let mut payload = json!({
            "channel": channel,
            "text": message.text,
            "link_names": true,
            "unfurl_links": false,
            "unfurl_media": false,
        });
        if !message.blocks.is_empty() {
            payload["blocks"] = Value::Array(message.blocks.clone());
        }

        let response: SlackChatMessageResponse = self
            .transport
            .send_json("chat.postMessage", || {
                self.transport
                    .http()
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(&self.token)
                    .json(&payload)
            })
            .await?;
        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                slack_error_label(response.error)
            );
        }

        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    /// Delete `ts`; user tokens delete as the authenticated user.
    pub async fn delete_message(&self, channel: &str, ts: &str) -> Result<()> {
        let mut payload = json!({
            "channel": channel,
            "ts": ts,
        });
        if self.actor == SlackActor::User {
            payload["as_user"] = Value::Bool(true);
        }
        let response: SlackAckResponse = self
            .transport
            .send_json("chat.delete", || {
                self.transport
                    .http()
                    .post(format!("{}/chat.delete", self.api_base))
                    .bearer_auth(&self.token)
                    .json(&payload)
            })
            .await?;
        if !response.ok {
            bail!(
                "slack chat.delete failed for ts {ts} as {}: {}",
                self.actor.as_str(),
                slack_error_label(response.error)
            );
        }
        Ok(())
    }
}

/// Slack reports most failures as HTTP 200 with `ok: false` and an error code.
fn slack_error_label(error: Option<String>) -> String {
    error
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown error".to_string())
}
