use std::sync::Arc;

use herald_slack::{SlackActor, SlackApiClient, SlackClientSettings};
use tracing::info;

use crate::channel_resolver::{resolve_channel, ChannelHandle};
use crate::chat_client::ChatClient;
use crate::error::HeraldError;

/// Token-level inputs for [`open_slack_session`].
#[derive(Debug, Clone)]
pub struct SlackSessionConfig {
    pub settings: SlackClientSettings,
    pub bot_token: String,
    /// User token of a privileged member; enables deleting messages the bot did not post.
    pub elevated_token: Option<String>,
    pub channel_name: String,
}

/// A resolved channel plus the clients allowed to act in it.
#[derive(Clone)]
pub struct ChatSession {
    channel: ChannelHandle,
    client: Arc<dyn ChatClient>,
    elevated: Option<Arc<dyn ChatClient>>,
}

impl ChatSession {
    /// Resolve `channel_name` with the standard client and bundle both clients.
    pub async fn open(
        client: Arc<dyn ChatClient>,
        elevated: Option<Arc<dyn ChatClient>>,
        channel_name: &str,
    ) -> Result<Self, HeraldError> {
        let channel = resolve_channel(client.as_ref(), channel_name).await?;
        info!(
            channel_id = %channel.id,
            channel = %channel.name,
            elevated = elevated.is_some(),
            "opened chat session"
        );
        Ok(Self::from_parts(channel, client, elevated))
    }

    pub fn from_parts(
        channel: ChannelHandle,
        client: Arc<dyn ChatClient>,
        elevated: Option<Arc<dyn ChatClient>>,
    ) -> Self {
        Self {
            channel,
            client,
            elevated,
        }
    }

    pub fn channel(&self) -> &ChannelHandle {
        &self.channel
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.client.as_ref()
    }

    pub fn elevated(&self) -> Option<&dyn ChatClient> {
        self.elevated.as_deref()
    }

    pub fn elevated_available(&self) -> bool {
        self.elevated.is_some()
    }

    /// Client used for deletions: the elevated one when configured.
    pub fn deleting_client(&self) -> &dyn ChatClient {
        self.elevated().unwrap_or_else(|| self.client())
    }
}

/// Build the Slack clients from tokens and resolve the configured channel.
pub async fn open_slack_session(config: &SlackSessionConfig) -> Result<ChatSession, HeraldError> {
    let client = SlackApiClient::new(&config.settings, &config.bot_token, SlackActor::Bot)
        .map_err(|error| HeraldError::Configuration(format!("{error:#}")))?;
    let elevated = match config
        .elevated_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        Some(token) => Some(Arc::new(
            SlackApiClient::new(&config.settings, token, SlackActor::User)
                .map_err(|error| HeraldError::Configuration(format!("{error:#}")))?,
        ) as Arc<dyn ChatClient>),
        None => None,
    };
    ChatSession::open(Arc::new(client), elevated, &config.channel_name).await
}
