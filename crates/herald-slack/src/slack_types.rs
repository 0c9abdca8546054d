//! Slack payload records and the validated views built from them.
//!
//! Web API responses are decoded into permissive records first (every field
//! optional) and only then promoted into [`ChannelMembership`] and
//! [`ChatMessage`]. Records missing an identifier are dropped at this boundary.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackConversationsListResponse {
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) channels: Vec<SlackConversationRecord>,
    #[serde(default)]
    pub(crate) response_metadata: Option<SlackResponseMetadata>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackConversationRecord {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) is_member: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackResponseMetadata {
    #[serde(default)]
    pub(crate) next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackMessagesResponse {
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) messages: Vec<SlackMessageRecord>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackMessageRecord {
    #[serde(default)]
    pub(crate) ts: Option<String>,
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) subtype: Option<String>,
    #[serde(default)]
    pub(crate) reply_count: Option<u64>,
    #[serde(default)]
    pub(crate) reactions: Vec<SlackReactionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackReactionRecord {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) count: Option<u64>,
}

/// A conversation returned by `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMembership {
    pub id: String,
    pub name: String,
    pub is_member: bool,
}

impl ChannelMembership {
    pub(crate) fn from_record(record: SlackConversationRecord) -> Option<Self> {
        let id = non_empty(record.id)?;
        let name = non_empty(record.name)?;
        Some(Self {
            id,
            name,
            is_member: record.is_member.unwrap_or(false),
        })
    }
}

/// One page of `conversations.list`; `next_cursor` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPage {
    pub channels: Vec<ChannelMembership>,
    pub next_cursor: Option<String>,
}

impl ChannelPage {
    pub(crate) fn from_response(response: SlackConversationsListResponse) -> Self {
        let total = response.channels.len();
        let channels = response
            .channels
            .into_iter()
            .filter_map(ChannelMembership::from_record)
            .collect::<Vec<_>>();
        if channels.len() < total {
            tracing::warn!(
                dropped = total - channels.len(),
                "ignoring conversations without id or name"
            );
        }
        let next_cursor = response
            .response_metadata
            .and_then(|metadata| non_empty(metadata.next_cursor));
        Self {
            channels,
            next_cursor,
        }
    }
}

/// Message subtype as reported by Slack; plain user/bot messages carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSubtype {
    /// Parent placeholder left behind when a message with replies is deleted.
    Tombstone,
    ChannelJoin,
    Other(String),
}

impl MessageSubtype {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "tombstone" => Some(Self::Tombstone),
            "channel_join" => Some(Self::ChannelJoin),
            other => Some(Self::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tombstone => "tombstone",
            Self::ChannelJoin => "channel_join",
            Self::Other(value) => value.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub name: String,
    pub count: u64,
}

/// Read-only view of a channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Opaque ordering key; also the identifier used for replies and deletion.
    pub ts: String,
    pub text: String,
    pub subtype: Option<MessageSubtype>,
    pub reply_count: u64,
    pub reactions: Vec<Reaction>,
}

impl ChatMessage {
    pub(crate) fn from_record(record: SlackMessageRecord) -> Option<Self> {
        let ts = non_empty(record.ts)?;
        let reactions = record
            .reactions
            .into_iter()
            .filter_map(|reaction| {
                Some(Reaction {
                    name: non_empty(reaction.name)?,
                    count: reaction.count.unwrap_or(0),
                })
            })
            .collect();
        Some(Self {
            ts,
            text: record.text.unwrap_or_default(),
            subtype: record.subtype.as_deref().and_then(MessageSubtype::parse),
            reply_count: record.reply_count.unwrap_or(0),
            reactions,
        })
    }

    pub(crate) fn from_records(operation: &str, records: Vec<SlackMessageRecord>) -> Vec<Self> {
        let total = records.len();
        let messages = records
            .into_iter()
            .filter_map(Self::from_record)
            .collect::<Vec<_>>();
        if messages.len() < total {
            tracing::warn!(
                operation,
                dropped = total - messages.len(),
                "ignoring messages without ts"
            );
        }
        messages
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self.subtype, Some(MessageSubtype::Tombstone))
    }

    /// True when at least one user left the named reaction.
    pub fn has_reaction(&self, name: &str) -> bool {
        self.reactions
            .iter()
            .any(|reaction| reaction.name == name && reaction.count >= 1)
    }
}

/// Text fallback plus Block Kit blocks for `chat.postMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    pub blocks: Vec<Value>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
