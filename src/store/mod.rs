// Reactive store - shared application state with persistence
//
// A flat string-keyed map of `StateValue`s, the single source of truth
// within a process. Every committed mutation writes the full snapshot to the
// storage backend before subscribers hear about it; a failed write rolls the
// mutation back, so memory and the persisted copy never diverge. Changes
// made by other tabs over the same backend arrive as storage-change events
// and are notified exactly like local writes - that is the whole cross-tab
// consistency mechanism, last writer wins.

mod value;

pub use value::StateValue;

use crate::error::StoreError;
use crate::events::StorageEvent;
use crate::storage::StorageBackend;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Default persistence key when the application does not pick one
pub const DEFAULT_STORAGE_KEY: &str = "store";

/// Full store state: a flat mapping from keys to values
pub type State = BTreeMap<String, StateValue>;

/// Outcome of one subscriber callback. A failing subscriber is logged and
/// never blocks notification of the rest.
pub type SubscriberResult = Result<(), Box<dyn std::error::Error>>;

type Subscriber = Box<dyn FnMut(&State) -> SubscriberResult>;

/// Handle returned by `subscribe`, used to unsubscribe by identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Keyed state container with write-through persistence
pub struct Store {
    state: State,
    storage_key: String,
    backend: Box<dyn StorageBackend>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    initialized: bool,
}

impl Store {
    /// Create a store over a storage backend. The store is inert until
    /// `init` runs.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            state: State::new(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backend: Box::new(backend),
            subscribers: Vec::new(),
            next_subscription: 0,
            initialized: false,
        }
    }

    /// Initialize once per process. A previously persisted snapshot under
    /// `storage_key` takes precedence over `initial_state` when it is a
    /// well-formed object; otherwise `initial_state` is used verbatim.
    /// Re-initialization is a no-op.
    pub fn init(&mut self, initial_state: State, storage_key: &str) {
        if self.initialized {
            return;
        }

        self.storage_key = storage_key.to_string();
        self.initialized = true;

        self.state = match self.load_snapshot() {
            Some(persisted) => {
                debug!(key = storage_key, "store restored from persisted snapshot");
                persisted
            }
            None => initial_state,
        };
    }

    /// Whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Value under `key`. `None` means the key is missing - a present but
    /// falsy value (empty string, zero, empty array) is always `Some`.
    pub fn get_state(&self, key: &str) -> Option<&StateValue> {
        self.state.get(key)
    }

    /// The full current state mapping
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Update `key`, persist the full snapshot, and notify subscribers.
    /// The mutation commits only if persistence succeeds; on failure the
    /// prior value is restored and subscribers are not notified.
    pub fn set_state(&mut self, key: &str, value: StateValue) -> Result<(), StoreError> {
        if !self.initialized {
            return Err(StoreError::Uninitialized);
        }
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        if let Err(reason) = value.validate() {
            return Err(StoreError::InvalidValue(reason));
        }

        let previous = self.state.insert(key.to_string(), value);

        if let Err(err) = self.persist() {
            error!(key, %err, "failed to persist state, rolling back");
            match previous {
                Some(prior) => self.state.insert(key.to_string(), prior),
                None => self.state.remove(key),
            };
            return Err(err.into());
        }

        self.notify();
        Ok(())
    }

    /// Register a callback invoked with the full state after every committed
    /// mutation, in registration order
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&State) -> SubscriberResult + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber; reports whether one was registered under `id`
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() < before
    }

    /// Apply a storage change made by another tab/process over the same
    /// backend. A matching key replaces the in-memory state wholesale and
    /// notifies local subscribers; a removed key resets to empty state.
    /// Unparseable external values are logged and leave state untouched.
    pub fn handle_storage_change(&mut self, event: &StorageEvent) {
        if !self.initialized || event.key != self.storage_key {
            return;
        }

        let external = match &event.new_value {
            None => State::new(),
            Some(raw) => match parse_snapshot(raw) {
                Ok(state) => state,
                Err(reason) => {
                    error!(key = %event.key, %reason, "ignoring malformed external storage change");
                    return;
                }
            },
        };

        self.state = external;
        self.notify();
    }

    fn persist(&mut self) -> Result<(), crate::error::PersistenceError> {
        let snapshot = serde_json::to_string(&self.state)
            .map_err(|e| crate::error::PersistenceError::Write(e.to_string()))?;
        self.backend.write(&self.storage_key, &snapshot)
    }

    fn load_snapshot(&self) -> Option<State> {
        let raw = match self.backend.read(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.storage_key, %err, "failed to load persisted state");
                return None;
            }
        };

        match parse_snapshot(&raw) {
            Ok(state) => Some(state),
            Err(reason) => {
                warn!(key = %self.storage_key, %reason, "discarding malformed persisted snapshot");
                None
            }
        }
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (id, subscriber) in self.subscribers.iter_mut() {
            if let Err(err) = subscriber(state) {
                warn!(subscription = id.0, %err, "subscriber failed during notification");
            }
        }
    }
}

/// Parse a raw snapshot: must be a JSON object whose members are all
/// representable state values
fn parse_snapshot(raw: &str) -> Result<State, String> {
    let json: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("not valid JSON: {}", e))?;

    let members = match json {
        serde_json::Value::Object(members) => members,
        other => return Err(format!("snapshot must be an object, got {}", other)),
    };

    members
        .iter()
        .map(|(key, value)| StateValue::from_json(value).map(|v| (key.clone(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::storage::MemoryStorage;
    use std::cell::Cell;
    use std::rc::Rc;

    fn initialized_store() -> Store {
        let mut store = Store::new(MemoryStorage::new());
        store.init(State::new(), "store");
        store
    }

    /// Backend whose writes can be switched off mid-test
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: Rc<Cell<bool>>,
    }

    impl StorageBackend for FlakyStorage {
        fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
            if self.fail_writes.get() {
                return Err(PersistenceError::Write("storage unavailable".to_string()));
            }
            self.inner.write(key, value)
        }
    }

    #[test]
    fn test_set_then_get_round_trips_all_variants() {
        let mut store = initialized_store();
        let object = StateValue::Object(
            [("title".to_string(), StateValue::from("First"))]
                .into_iter()
                .collect(),
        );

        store.set_state("s", StateValue::from("text")).unwrap();
        store.set_state("n", StateValue::from(42.0)).unwrap();
        store.set_state("o", object.clone()).unwrap();
        store
            .set_state("a", StateValue::Array(vec![StateValue::from(1.0)]))
            .unwrap();

        assert_eq!(store.get_state("s").and_then(StateValue::as_str), Some("text"));
        assert_eq!(store.get_state("n").and_then(StateValue::as_num), Some(42.0));
        assert_eq!(store.get_state("o"), Some(&object));
        assert_eq!(
            store.get_state("a").and_then(StateValue::as_array).map(<[_]>::len),
            Some(1)
        );
        assert_eq!(store.get_state("missing"), None);
    }

    #[test]
    fn test_invalid_writes_leave_prior_state() {
        let mut store = initialized_store();
        store.set_state("k", StateValue::from("kept")).unwrap();

        assert!(matches!(
            store.set_state("k", StateValue::Num(f64::NAN)),
            Err(StoreError::InvalidValue(_))
        ));
        assert!(matches!(
            store.set_state("", StateValue::from(1.0)),
            Err(StoreError::InvalidKey(_))
        ));

        assert_eq!(store.get_state("k").and_then(StateValue::as_str), Some("kept"));
    }

    #[test]
    fn test_set_state_before_init_is_rejected() {
        let mut store = Store::new(MemoryStorage::new());
        assert_eq!(
            store.set_state("k", StateValue::from(1.0)),
            Err(StoreError::Uninitialized)
        );
    }

    #[test]
    fn test_init_prefers_persisted_snapshot() {
        let mut backend = MemoryStorage::new();
        backend.write("store", r#"{"k":"persisted"}"#).unwrap();

        let mut store = Store::new(backend);
        let initial = [("k".to_string(), StateValue::from("initial"))]
            .into_iter()
            .collect();
        store.init(initial, "store");

        assert_eq!(store.get_state("k").and_then(StateValue::as_str), Some("persisted"));
    }

    #[test]
    fn test_init_falls_back_on_malformed_snapshot() {
        for raw in ["not json", "[1,2]", r#"{"k":null}"#, "3"] {
            let mut backend = MemoryStorage::new();
            backend.write("store", raw).unwrap();

            let mut store = Store::new(backend);
            let initial = [("k".to_string(), StateValue::from("initial"))]
                .into_iter()
                .collect();
            store.init(initial, "store");

            assert_eq!(
                store.get_state("k").and_then(StateValue::as_str),
                Some("initial"),
                "snapshot {:?} should be discarded",
                raw
            );
        }
    }

    #[test]
    fn test_reinit_is_a_no_op() {
        let mut store = initialized_store();
        store.set_state("k", StateValue::from("kept")).unwrap();

        let replacement = [("k".to_string(), StateValue::from("clobbered"))]
            .into_iter()
            .collect();
        store.init(replacement, "other");

        assert_eq!(store.get_state("k").and_then(StateValue::as_str), Some("kept"));
    }

    #[test]
    fn test_subscriber_invoked_once_per_write_with_full_state() {
        let mut store = initialized_store();
        store.set_state("first", StateValue::from(1.0)).unwrap();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |state| {
            seen.set(seen.get() + 1);
            assert_eq!(state.len(), 2, "callback receives the full post-write state");
            Ok(())
        });

        store.set_state("second", StateValue::from(2.0)).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failing_subscriber_does_not_block_the_rest() {
        let mut store = initialized_store();

        store.subscribe(|_| Err("misbehaving subscriber".into()));
        let reached = Rc::new(Cell::new(false));
        let flag = Rc::clone(&reached);
        store.subscribe(move |_| {
            flag.set(true);
            Ok(())
        });

        store.set_state("k", StateValue::from(1.0)).unwrap();
        assert!(reached.get());
    }

    #[test]
    fn test_unsubscribe_removes_by_identity() {
        let mut store = initialized_store();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let id = store.subscribe(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));

        store.set_state("k", StateValue::from(1.0)).unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_persistence_happens_before_notification() {
        let backend = MemoryStorage::new();
        let observer = backend.clone();
        let mut store = Store::new(backend);
        store.init(State::new(), "store");

        let observed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&observed);
        store.subscribe(move |_| {
            let raw = observer.read("store").unwrap().unwrap_or_default();
            flag.set(raw.contains("committed"));
            Ok(())
        });

        store.set_state("k", StateValue::from("committed")).unwrap();
        assert!(observed.get(), "snapshot was persisted before notification");
    }

    #[test]
    fn test_failed_persistence_rolls_back_and_skips_notification() {
        let fail = Rc::new(Cell::new(false));
        let mut store = Store::new(FlakyStorage {
            inner: MemoryStorage::new(),
            fail_writes: Rc::clone(&fail),
        });
        store.init(State::new(), "store");
        store.set_state("k", StateValue::from("before")).unwrap();

        let notified = Rc::new(Cell::new(0));
        let count = Rc::clone(&notified);
        store.subscribe(move |_| {
            count.set(count.get() + 1);
            Ok(())
        });

        fail.set(true);
        let result = store.set_state("k", StateValue::from("after"));

        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(store.get_state("k").and_then(StateValue::as_str), Some("before"));
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn test_external_change_replaces_state_and_notifies() {
        let mut store = initialized_store();
        store.set_state("k", StateValue::from("local")).unwrap();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |state| {
            assert_eq!(
                state.get("k").and_then(StateValue::as_str),
                Some("external")
            );
            seen.set(seen.get() + 1);
            Ok(())
        });

        store.handle_storage_change(&StorageEvent::new("store", Some(r#"{"k":"external"}"#)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_external_change_for_other_key_is_ignored() {
        let mut store = initialized_store();
        store.set_state("k", StateValue::from("local")).unwrap();

        store.handle_storage_change(&StorageEvent::new("unrelated", Some(r#"{"k":"x"}"#)));
        assert_eq!(store.get_state("k").and_then(StateValue::as_str), Some("local"));
    }

    #[test]
    fn test_malformed_external_change_leaves_state_unchanged() {
        let mut store = initialized_store();
        store.set_state("k", StateValue::from("local")).unwrap();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        store.handle_storage_change(&StorageEvent::new("store", Some("{broken")));
        assert_eq!(store.get_state("k").and_then(StateValue::as_str), Some("local"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_external_removal_resets_to_empty_state() {
        let mut store = initialized_store();
        store.set_state("k", StateValue::from("local")).unwrap();

        store.handle_storage_change(&StorageEvent::new("store", None));
        assert_eq!(store.get_state("k"), None);
    }

    #[test]
    fn test_two_stores_over_one_backend_stay_consistent() {
        // Two "tabs": same backend, separate stores
        let backend = MemoryStorage::new();
        let mut tab_a = Store::new(backend.clone());
        let mut tab_b = Store::new(backend.clone());
        tab_a.init(State::new(), "store");
        tab_b.init(State::new(), "store");

        tab_a.set_state("k", StateValue::from("from tab a")).unwrap();

        // The host delivers the storage event to the other tab
        let raw = backend.read("store").unwrap();
        tab_b.handle_storage_change(&StorageEvent::new("store", raw.as_deref()));

        assert_eq!(
            tab_b.get_state("k").and_then(StateValue::as_str),
            Some("from tab a")
        );
    }
}
