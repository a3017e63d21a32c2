// Trellis - a minimal single-page UI framework
//
// Mounts view components into an in-memory host document, routes between
// views by URL path without page reloads, and shares application state
// across views with write-through persistence and cross-tab consistency.
//
// Architecture:
// - dom: in-memory document model (render surface, events, markup)
// - component: the View trait plus lifecycle/binding bookkeeping
// - router: path-pattern matching, history integration, nav interception
// - store: keyed reactive state with persistence and subscribers
// - theme: theme/font preference service (a store consumer)
// - history/storage: host facilities (session history, key-value storage)
// - events: the inbound host-event model the application loop dispatches
//
// The whole core is single-threaded and event-driven: every operation runs
// to completion within one event-handling turn.

pub mod component;
pub mod demo;
pub mod dom;
pub mod error;
pub mod events;
pub mod history;
pub mod router;
pub mod storage;
pub mod store;
pub mod theme;

pub use component::{Component, Params, View, ViewScope};
pub use dom::{Document, Event, EventHandler, ListenerOptions, Markup, NodeHandle};
pub use error::{FrameworkError, PersistenceError, StoreError};
pub use events::{HostEvent, StorageEvent};
pub use history::{History, HistoryEntry};
pub use router::{Route, Router};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{State, StateValue, Store, SubscriptionId};
pub use theme::{ColorScheme, Font, Preference, Preferences, ThemeChoice};
