//! Slack Web API transport for herald.
//!
//! Wraps the handful of Web API methods herald needs (channel membership
//! listing, history, thread replies, posting and deletion) and validates the
//! loosely-typed responses into the message and channel types used by the
//! announcement and reconciliation flows.

pub mod slack_api_client;
pub mod slack_types;

pub use slack_api_client::{SlackActor, SlackApiClient, SlackClientSettings, SlackPostedMessage};
pub use slack_types::{
    ChannelMembership, ChannelPage, ChatMessage, MessageSubtype, OutgoingMessage, Reaction,
};
