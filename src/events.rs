// Host events that flow into the framework
//
// The core is single-threaded and event-driven: everything that happens
// between discrete host events runs to completion synchronously. Each
// variant maps to exactly one handler - activations and history changes go
// to the router, storage changes to the store, scheme changes to the
// preference service. Using an enum keeps the application loop a single
// exhaustive match.

use crate::dom::NodeHandle;
use crate::history::HistoryEntry;

/// An inbound event from the host environment
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// An element was activated (clicked); the router resolves delegated
    /// navigation from the event target
    Activation { target: NodeHandle },

    /// The user moved through session history (back/forward); the payload is
    /// the entry navigated to, absent for the initial page-load entry
    HistoryChange { entry: Option<HistoryEntry> },

    /// Another tab/process wrote to shared storage
    StorageChange(StorageEvent),

    /// The system color-scheme preference flipped
    ColorSchemeChange { dark: bool },
}

/// A change made to shared storage by another tab or process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The storage key that changed
    pub key: String,
    /// The new raw value, `None` when the key was removed
    pub new_value: Option<String>,
}

impl StorageEvent {
    pub fn new(key: &str, new_value: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            new_value: new_value.map(str::to_string),
        }
    }
}
