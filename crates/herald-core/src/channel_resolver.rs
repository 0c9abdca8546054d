//! Resolves the configured channel name against the bot's channel memberships.

use futures_util::stream::{self, Stream, StreamExt};
use herald_slack::ChannelMembership;
use tracing::{debug, warn};

use crate::chat_client::ChatClient;
use crate::error::HeraldError;

/// A channel the bot belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: String,
    pub name: String,
}

impl From<ChannelMembership> for ChannelHandle {
    fn from(channel: ChannelMembership) -> Self {
        Self {
            id: channel.id,
            name: channel.name,
        }
    }
}

enum PageCursor {
    First,
    Next(String),
    Exhausted,
}

/// Lazily walk the channel listing one page at a time.
///
/// The stream ends after the page without a continuation cursor, or at the
/// first page that fails to load; channels from earlier pages are still yielded.
pub fn membership_pages(
    client: &dyn ChatClient,
) -> impl Stream<Item = Vec<ChannelMembership>> + Send + '_ {
    stream::unfold((PageCursor::First, 1_usize), move |(cursor, page)| async move {
        let cursor = match cursor {
            PageCursor::First => None,
            PageCursor::Next(cursor) => Some(cursor),
            PageCursor::Exhausted => return None,
        };
        match client.list_channels_page(cursor.as_deref()).await {
            Ok(result) => {
                debug!(
                    page,
                    channels = result.channels.len(),
                    has_more = result.next_cursor.is_some(),
                    "fetched channel listing page"
                );
                let next = match result.next_cursor {
                    Some(cursor) => PageCursor::Next(cursor),
                    None => PageCursor::Exhausted,
                };
                Some((result.channels, (next, page.saturating_add(1))))
            }
            Err(error) => {
                let error = HeraldError::PaginationPage {
                    page,
                    source: error.into(),
                };
                warn!(error = %error.chain(), "stopping channel listing early");
                None
            }
        }
    })
}

/// Channels from every page that the bot is a member of.
pub fn member_channels(
    pages: impl IntoIterator<Item = Vec<ChannelMembership>>,
) -> Vec<ChannelMembership> {
    pages
        .into_iter()
        .flatten()
        .filter(|channel| channel.is_member)
        .collect()
}

/// Find the member channel whose name (or id) matches `configured_name`.
pub async fn resolve_channel(
    client: &dyn ChatClient,
    configured_name: &str,
) -> Result<ChannelHandle, HeraldError> {
    let wanted = configured_name.trim().trim_start_matches('#');
    if wanted.is_empty() {
        return Err(HeraldError::Configuration(
            "slack channel name must not be empty".to_string(),
        ));
    }

    let pages = membership_pages(client).collect::<Vec<_>>().await;
    let members = member_channels(pages);
    let scanned = members.len();
    members
        .into_iter()
        .find(|channel| channel.name == wanted || channel.id == wanted)
        .map(ChannelHandle::from)
        .ok_or_else(|| HeraldError::ChannelNotFound {
            name: wanted.to_string(),
            scanned,
        })
}
