use herald_github::PullRequestEvent;

/// Flow a pull request event action maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventRoute {
    Announce,
    Reconcile,
    Ignore,
}

impl EventRoute {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Announce => "announce",
            Self::Reconcile => "reconcile",
            Self::Ignore => "ignore",
        }
    }
}

/// `submitted` comes from `pull_request_review`; the rest from `pull_request`.
pub(crate) fn route_for_action(action: &str) -> EventRoute {
    match action.trim() {
        "opened" | "reopened" | "ready_for_review" => EventRoute::Announce,
        "closed" | "converted_to_draft" | "review_requested" | "submitted" => {
            EventRoute::Reconcile
        }
        _ => EventRoute::Ignore,
    }
}

/// Like [`route_for_action`], except that the author's review of their own
/// pull request does not claim it and leaves the announcement in place.
pub(crate) fn route_for_event(event: &PullRequestEvent) -> EventRoute {
    if event.action == "submitted" && event.is_author_review() {
        return EventRoute::Ignore;
    }
    route_for_action(&event.action)
}
