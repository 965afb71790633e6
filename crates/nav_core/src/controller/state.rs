//! Active page state and the reconciliation state machine.

use shared::domain::{MenuEntry, NavSequence};

/// Which entry the current logical location resolved to, and what was last
/// rendered for it. Entry and url always change together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivePageState {
    active_entry: Option<usize>,
    active_url: Option<String>,
    rendered_content: Option<String>,
}

impl ActivePageState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn matched(entry: usize, url: impl Into<String>) -> Self {
        Self {
            active_entry: Some(entry),
            active_url: Some(url.into()),
            rendered_content: None,
        }
    }

    pub(crate) fn with_rendered(self, html: impl Into<String>) -> Self {
        Self {
            rendered_content: Some(html.into()),
            ..self
        }
    }

    pub fn active_entry(&self) -> Option<usize> {
        self.active_entry
    }

    pub fn active_url(&self) -> Option<&str> {
        self.active_url.as_deref()
    }

    pub fn rendered_content(&self) -> Option<&str> {
        self.rendered_content.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.active_entry.is_none()
    }
}

/// Where the controller is in the current cycle. A successful cycle rests in
/// `Synced` until the next history change; `Synced` counts as idle and there
/// is no separate transition back to `Idle`. `Idle` is the state before the
/// first navigation and after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Resolving,
    Fetching,
    Rendering,
    Synced,
    ExternalNavigation,
}

/// A fetch/render cycle that has been resolved but not yet run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCycle {
    pub seq: NavSequence,
    pub url: String,
    pub entry_index: usize,
    pub entry: MenuEntry,
}

/// Result of the synchronous half of a history change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No entry matched; a full page load was issued.
    External { url: String },
    Fetch(PendingCycle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Synced { html: String },
    /// A newer navigation started before this one finished.
    Discarded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_state_starts_without_content() {
        let state = ActivePageState::matched(2, "/about");
        assert_eq!(state.active_entry(), Some(2));
        assert_eq!(state.active_url(), Some("/about"));
        assert_eq!(state.rendered_content(), None);

        let state = state.with_rendered("<p>hi</p>");
        assert_eq!(state.rendered_content(), Some("<p>hi</p>"));
        assert!(!state.is_empty());
    }
}
