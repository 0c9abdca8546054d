//! Removal of announcements (and their threads) that are no longer wanted.
//!
//! Candidates are re-derived on every run from the most recent channel
//! history: system messages, messages linking the pull request, and, when an
//! elevated client is configured, anything a human approved with a check-mark
//! reaction. Threads under a candidate are expanded into candidates too.
//! Deletion stops at the first failure; what was already removed stays removed.

use std::collections::HashSet;

use herald_slack::ChatMessage;
use tracing::{debug, info, warn};

use crate::chat_session::ChatSession;
use crate::error::HeraldError;

/// Number of most recent messages inspected per run.
pub const HISTORY_LOOKBACK: usize = 20;
/// Reaction that marks a message for removal by the elevated client.
pub const APPROVAL_REACTION: &str = "white_check_mark";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateReason {
    SystemMessage,
    UrlMatch,
    ApprovalReaction,
    Reply,
}

/// Messages selected for deletion, in discovery order, unique by `ts`.
#[derive(Debug, Clone, Default)]
pub struct DeletionCandidateSet {
    entries: Vec<(ChatMessage, CandidateReason)>,
    seen: HashSet<String>,
}

impl DeletionCandidateSet {
    /// Returns false when a message with the same `ts` is already present.
    pub fn insert(&mut self, message: ChatMessage, reason: CandidateReason) -> bool {
        if !self.seen.insert(message.ts.clone()) {
            return false;
        }
        self.entries.push((message, reason));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ChatMessage, CandidateReason)> {
        self.entries.iter()
    }

    fn thread_roots(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(message, _)| message.reply_count > 0)
            .map(|(message, _)| message.ts.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub candidates: usize,
    pub deleted: Vec<String>,
    pub skipped_tombstones: usize,
    pub thread_failures: usize,
    /// `ts` of the message whose deletion failed and ended the pass.
    pub halted: Option<String>,
}

/// True when `text` links `pr_url` itself rather than a longer number sharing
/// its prefix (`/pull/12` must not match `/pull/123`).
pub fn mentions_pull_request(text: &str, pr_url: &str) -> bool {
    if pr_url.is_empty() {
        return false;
    }
    text.match_indices(pr_url).any(|(start, _)| {
        !text[start + pr_url.len()..]
            .chars()
            .next()
            .is_some_and(|next| next.is_ascii_digit())
    })
}

pub fn classify_message(
    message: &ChatMessage,
    pr_url: &str,
    elevated_available: bool,
) -> Option<CandidateReason> {
    if message.subtype.is_some() {
        return Some(CandidateReason::SystemMessage);
    }
    if mentions_pull_request(&message.text, pr_url) {
        return Some(CandidateReason::UrlMatch);
    }
    if elevated_available && message.has_reaction(APPROVAL_REACTION) {
        return Some(CandidateReason::ApprovalReaction);
    }
    None
}

pub async fn reconcile_stale(
    pr_url: &str,
    session: &ChatSession,
) -> Result<ReconcileReport, HeraldError> {
    let pr_url = pr_url.trim();
    if pr_url.is_empty() {
        return Err(HeraldError::Configuration(
            "pull request url must not be empty".to_string(),
        ));
    }
    let channel = session.channel().id.as_str();
    let elevated_available = session.elevated_available();

    let history = session
        .client()
        .recent_messages(channel, HISTORY_LOOKBACK)
        .await
        .map_err(|error| HeraldError::HistoryFetch {
            channel: channel.to_string(),
            source: error.into(),
        })?;

    let mut report = ReconcileReport {
        scanned: history.len(),
        ..ReconcileReport::default()
    };
    let mut candidates = DeletionCandidateSet::default();
    for message in history {
        if let Some(reason) = classify_message(&message, pr_url, elevated_available) {
            debug!(ts = %message.ts, ?reason, "deletion candidate");
            candidates.insert(message, reason);
        }
    }

    for root in candidates.thread_roots() {
        match session.client().thread_replies(channel, &root).await {
            Ok(thread) => {
                for reply in thread.into_iter().skip(1) {
                    candidates.insert(reply, CandidateReason::Reply);
                }
            }
            Err(error) => {
                let error = HeraldError::ThreadFetch {
                    ts: root,
                    source: error.into(),
                };
                warn!(error = %error.chain(), "skipping thread replies");
                report.thread_failures += 1;
            }
        }
    }

    report.candidates = candidates.len();
    if candidates.is_empty() {
        info!(scanned = report.scanned, pr_url, "no stale messages to remove");
        return Ok(report);
    }

    let deleter = session.deleting_client();
    for (message, reason) in candidates.iter() {
        if message.is_tombstone() {
            report.skipped_tombstones += 1;
            continue;
        }
        match deleter.delete_message(channel, &message.ts).await {
            Ok(()) => {
                debug!(ts = %message.ts, ?reason, actor = deleter.actor_label(), "deleted message");
                report.deleted.push(message.ts.clone());
            }
            Err(error) => {
                let error = HeraldError::DeleteAuthorization {
                    ts: message.ts.clone(),
                    actor: deleter.actor_label(),
                    source: error.into(),
                };
                warn!(error = %error.chain(), "abandoning remaining deletions");
                report.halted = Some(message.ts.clone());
                break;
            }
        }
    }

    info!(
        scanned = report.scanned,
        candidates = report.candidates,
        deleted = report.deleted.len(),
        skipped_tombstones = report.skipped_tombstones,
        halted = report.halted.is_some(),
        "reconciled stale messages"
    );
    Ok(report)
}
