use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure taxonomy for announcement and reconciliation runs.
///
/// `ThreadFetch`, `DeleteAuthorization` and `PaginationPage` are logged and
/// absorbed by the flows that produce them; the remaining variants fail the run.
#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("no member channel named '{name}' among {scanned} listed channel(s)")]
    ChannelNotFound { name: String, scanned: usize },
    #[error("failed to fetch history for channel {channel}")]
    HistoryFetch {
        channel: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to fetch replies for thread {ts}")]
    ThreadFetch {
        ts: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to delete message {ts} as {actor}")]
    DeleteAuthorization {
        ts: String,
        actor: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("failed to fetch channel listing page {page}")]
    PaginationPage {
        page: usize,
        #[source]
        source: BoxError,
    },
    #[error("pull request provider failed to {operation}")]
    ProviderQuery {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("failed to post announcement to channel {channel}")]
    ChatPost {
        channel: String,
        #[source]
        source: BoxError,
    },
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl HeraldError {
    pub fn provider(operation: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |error| Self::ProviderQuery {
            operation,
            source: error.into(),
        }
    }

    /// Message plus every source, joined with `: ` for single-line logs.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}
