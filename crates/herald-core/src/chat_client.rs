use anyhow::Result;
use async_trait::async_trait;
use herald_slack::{ChannelPage, ChatMessage, OutgoingMessage, SlackApiClient, SlackPostedMessage};

/// Messaging operations herald needs from a chat workspace.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Identity used for deletions, reported in logs and errors.
    fn actor_label(&self) -> &'static str;

    async fn list_channels_page(&self, cursor: Option<&str>) -> Result<ChannelPage>;

    async fn recent_messages(&self, channel: &str, limit: usize) -> Result<Vec<ChatMessage>>;

    /// Thread rooted at `ts`, root first.
    async fn thread_replies(&self, channel: &str, ts: &str) -> Result<Vec<ChatMessage>>;

    async fn post_message(
        &self,
        channel: &str,
        message: &OutgoingMessage,
    ) -> Result<SlackPostedMessage>;

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<()>;
}

#[async_trait]
impl ChatClient for SlackApiClient {
    fn actor_label(&self) -> &'static str {
        self.actor().as_str()
    }

    async fn list_channels_page(&self, cursor: Option<&str>) -> Result<ChannelPage> {
        self.list_conversations_page(cursor).await
    }

    async fn recent_messages(&self, channel: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        self.conversation_history(channel, limit).await
    }

    async fn thread_replies(&self, channel: &str, ts: &str) -> Result<Vec<ChatMessage>> {
        self.conversation_replies(channel, ts).await
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &OutgoingMessage,
    ) -> Result<SlackPostedMessage> {
        SlackApiClient::post_message(self, channel, message).await
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<()> {
        SlackApiClient::delete_message(self, channel, ts).await
    }
}
