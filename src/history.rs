// In-memory navigation history - the host history facility
//
// Models a browser session history: an entry stack with a cursor, a live
// location, and `{path}` payloads attached by programmatic pushes. Moving
// the cursor (back/forward) returns the entry navigated to; the application
// loop feeds that entry to the router as a history-change event, mirroring
// `popstate`. The initial entry carries no payload, which is why the router
// falls back to the live location when the payload is absent.

/// One history slot: the location it shows plus the pushed payload, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Location URL for this slot (path, possibly with query/fragment)
    pub url: String,
    /// The `{path}` payload attached by `push_state`; `None` for entries
    /// created by the initial page load
    pub state: Option<String>,
}

/// Session history stack
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl History {
    /// Start a session at the given location
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![HistoryEntry {
                url: initial_url.to_string(),
                state: None,
            }],
            index: 0,
        }
    }

    /// Push a new entry carrying a `{path}` payload and move to it.
    /// Forward entries beyond the cursor are discarded, as in a browser.
    pub fn push_state(&mut self, path: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            url: path.to_string(),
            state: Some(path.to_string()),
        });
        self.index = self.entries.len() - 1;
    }

    /// Current location URL
    pub fn location(&self) -> &str {
        &self.entries[self.index].url
    }

    /// Move one entry back; returns the entry navigated to, or `None` when
    /// already at the oldest entry (no event fires in that case)
    pub fn back(&mut self) -> Option<HistoryEntry> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Move one entry forward; returns the entry navigated to, or `None`
    /// when already at the newest entry
    pub fn forward(&mut self) -> Option<HistoryEntry> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    /// Number of entries in the session
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A history always holds at least the initial entry
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = History::new("/");
        history.push_state("/archives");
        history.push_state("/note/First");
        history.back();
        history.push_state("/note/Second");

        assert_eq!(history.len(), 3);
        assert_eq!(history.location(), "/note/Second");
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_back_returns_entry_with_payload() {
        let mut history = History::new("/");
        history.push_state("/archives");

        let entry = history.back().expect("moved back");
        assert_eq!(entry.url, "/");
        assert_eq!(entry.state, None, "initial entry has no payload");

        let entry = history.forward().expect("moved forward");
        assert_eq!(entry.state.as_deref(), Some("/archives"));
    }

    #[test]
    fn test_back_at_oldest_is_a_no_op() {
        let mut history = History::new("/");
        assert!(history.back().is_none());
        assert_eq!(history.location(), "/");
    }
}
