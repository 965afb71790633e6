//! In-memory session history with back/forward.

use std::sync::Mutex;

use shared::protocol::LocationChange;
use tracing::debug;

use crate::{
    collaborators::{HistoryFacade, LocationHandler},
    lock,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    url: String,
    title: Option<String>,
}

struct HistoryState {
    entries: Vec<HistoryEntry>,
    index: usize,
    handlers: Vec<LocationHandler>,
}

pub struct MemoryHistory {
    inner: Mutex<HistoryState>,
}

impl MemoryHistory {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(HistoryState {
                entries: vec![HistoryEntry {
                    url: start_url.into(),
                    title: None,
                }],
                index: 0,
                handlers: Vec::new(),
            }),
        }
    }

    pub fn go_back(&self) -> bool {
        self.step(-1)
    }

    pub fn go_forward(&self) -> bool {
        self.step(1)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_title(&self) -> Option<String> {
        let inner = lock(&self.inner);
        inner.entries[inner.index].title.clone()
    }

    fn step(&self, delta: isize) -> bool {
        let change = {
            let mut inner = lock(&self.inner);
            let Some(target) = inner.index.checked_add_signed(delta) else {
                return false;
            };
            if target >= inner.entries.len() {
                return false;
            }
            inner.index = target;
            let entry = &inner.entries[target];
            LocationChange {
                url: entry.url.clone(),
                title: entry.title.clone(),
            }
        };
        debug!(url = %change.url, delta, "history traversal");
        self.notify(&change);
        true
    }

    // Handlers run without the lock held; they call back into current_location.
    fn notify(&self, change: &LocationChange) {
        let handlers = lock(&self.inner).handlers.clone();
        for handler in handlers {
            handler(change);
        }
    }
}

impl HistoryFacade for MemoryHistory {
    /// Pushing the current location again is a no-op and does not notify.
    fn push_location(&self, title: Option<&str>, url: &str) {
        let change = {
            let mut inner = lock(&self.inner);
            if inner.entries[inner.index].url == url {
                return;
            }
            // Remove any forward history when navigating to a new location
            let keep = inner.index + 1;
            inner.entries.truncate(keep);
            inner.entries.push(HistoryEntry {
                url: url.to_string(),
                title: title.map(str::to_string),
            });
            inner.index += 1;
            LocationChange {
                url: url.to_string(),
                title: title.map(str::to_string),
            }
        };
        debug!(url, "history push");
        self.notify(&change);
    }

    fn current_location(&self) -> String {
        let inner = lock(&self.inner);
        inner.entries[inner.index].url.clone()
    }

    fn on_location_change(&self, handler: LocationHandler) {
        lock(&self.inner).handlers.push(handler);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    fn counting(history: &MemoryHistory) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        history.on_location_change(Arc::new(move |_change: &LocationChange| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    #[test]
    fn push_truncates_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push_location(Some("A"), "/a");
        history.push_location(Some("B"), "/b");
        assert!(history.go_back());
        history.push_location(Some("C"), "/c");

        assert_eq!(history.len(), 3);
        assert_eq!(history.current_location(), "/c");
        assert!(!history.go_forward());
    }

    #[test]
    fn back_and_forward_notify_and_stop_at_bounds() {
        let history = MemoryHistory::new("/");
        let count = counting(&history);
        history.push_location(Some("A"), "/a");

        assert!(history.go_back());
        assert_eq!(history.current_location(), "/");
        assert!(!history.go_back());
        assert!(history.go_forward());
        assert_eq!(history.current_location(), "/a");
        assert_eq!(history.current_title().as_deref(), Some("A"));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn pushing_current_location_is_silent() {
        let history = MemoryHistory::new("/a");
        let count = counting(&history);
        history.push_location(Some("A"), "/a");

        assert_eq!(history.len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
