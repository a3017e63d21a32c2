// Demo application - the Notes sample wired over the framework
//
// Three views (Notes, Archives, Note) bound to routes, sharing state
// through the store under the `notes` / `archived` keys. This is both a
// showcase for the binary and the end-to-end fixture the integration tests
// drive: everything a real application would wire at bootstrap happens in
// `DemoApp::bootstrap`, and host events funnel through `handle_event`.

use crate::component::{Component, Params, View, ViewScope};
use crate::dom::{Document, ListenerOptions, Markup};
use crate::events::HostEvent;
use crate::history::History;
use crate::router::{Route, Router, APP_ROOT_CLASS, NAV_CLASS};
use crate::storage::StorageBackend;
use crate::store::{StateValue, Store};
use crate::theme::Preferences;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

/// Store key holding the active notes array
pub const NOTES_KEY: &str = "notes";

/// Store key holding the archived notes array
pub const ARCHIVED_KEY: &str = "archived";

/// One note as the demo stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub title: String,
    pub body: String,
    pub created: String,
}

impl NoteRecord {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            created: Utc::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Notes the demo seeds the store with on first run
pub fn sample_notes() -> Vec<NoteRecord> {
    vec![
        NoteRecord::new("Japanese Cooking", "Dashi first, everything else second."),
        NoteRecord::new("Reading List", "Three novels deep, two to go."),
    ]
}

fn notes_from_state(value: Option<&StateValue>) -> Vec<NoteRecord> {
    let Some(value) = value else {
        return Vec::new();
    };
    serde_json::to_value(value)
        .ok()
        .and_then(|json| serde_json::from_value(json).ok())
        .unwrap_or_default()
}

fn notes_to_value(notes: &[NoteRecord]) -> anyhow::Result<StateValue> {
    let json = serde_json::to_value(notes).context("serializing notes")?;
    StateValue::from_json(&json).map_err(anyhow::Error::msg)
}

/// Minimal percent-encoding for the one character note titles need in paths
fn encode_path_segment(segment: &str) -> String {
    segment.replace(' ', "%20")
}

fn decode_path_segment(segment: &str) -> String {
    segment.replace("%20", " ")
}

fn note_link(note: &NoteRecord) -> Markup {
    Markup::element("li").child(
        Markup::element("a")
            .class(NAV_CLASS)
            .attr("href", &format!("/note/{}", encode_path_segment(&note.title)))
            .child(Markup::text(note.title.clone())),
    )
}

/// The notes index: lists active notes, links to each and to the archive
pub struct NotesView {
    store: Rc<RefCell<Store>>,
}

impl View for NotesView {
    fn name(&self) -> &'static str {
        "notes"
    }

    fn render(&self, _state: &Params) -> anyhow::Result<Markup> {
        let store = self.store.borrow();
        let notes = notes_from_state(store.get_state(NOTES_KEY));

        Ok(Markup::element("section")
            .class("notes")
            .child(Markup::element("h1").child(Markup::text("Notes")))
            .child(Markup::element("ul").children(notes.iter().map(note_link)))
            .child(
                Markup::element("button")
                    .class("add-note")
                    .child(Markup::text("New note")),
            )
            .child(
                Markup::element("a")
                    .class(NAV_CLASS)
                    .attr("href", "/archives")
                    .child(Markup::text("Archives")),
            ))
    }

    fn after_mount(&mut self, scope: &mut ViewScope) -> anyhow::Result<()> {
        let button = scope
            .find("add-note")
            .context("notes view did not render its add button")?;

        let store = Rc::clone(&self.store);
        scope.register_event_listener(
            &button,
            "click",
            Rc::new(move |_event| {
                let mut store = store.borrow_mut();
                let mut notes = notes_from_state(store.get_state(NOTES_KEY));
                let title = format!("Untitled {}", notes.len() + 1);
                notes.push(NoteRecord::new(&title, ""));
                match notes_to_value(&notes) {
                    Ok(value) => {
                        if let Err(err) = store.set_state(NOTES_KEY, value) {
                            debug!(%err, "could not save new note");
                        }
                    }
                    Err(err) => debug!(%err, "could not encode new note"),
                }
            }),
            ListenerOptions::default(),
        )?;
        Ok(())
    }
}

/// A single note, resolved from the `:title` route param
pub struct NoteView {
    store: Rc<RefCell<Store>>,
}

impl View for NoteView {
    fn name(&self) -> &'static str {
        "note"
    }

    fn render(&self, state: &Params) -> anyhow::Result<Markup> {
        let title = state
            .get("title")
            .map(|raw| decode_path_segment(raw))
            .unwrap_or_default();

        let store = self.store.borrow();
        let notes = notes_from_state(store.get_state(NOTES_KEY));
        let note = notes.iter().find(|note| note.title == title);

        let article = match note {
            Some(note) => Markup::element("article")
                .class("note")
                .child(Markup::element("h1").child(Markup::text(note.title.clone())))
                .child(Markup::element("p").child(Markup::text(note.body.clone())))
                .child(
                    Markup::element("time").child(Markup::text(note.created.clone())),
                ),
            None => Markup::element("article")
                .class("note")
                .child(Markup::element("p").child(Markup::text("Note not found."))),
        };

        Ok(article.child(
            Markup::element("a")
                .class(NAV_CLASS)
                .attr("href", "/")
                .child(Markup::text("Back")),
        ))
    }
}

/// Archived notes, read-only
pub struct ArchiveView {
    store: Rc<RefCell<Store>>,
}

impl View for ArchiveView {
    fn name(&self) -> &'static str {
        "archives"
    }

    fn render(&self, _state: &Params) -> anyhow::Result<Markup> {
        let store = self.store.borrow();
        let archived = notes_from_state(store.get_state(ARCHIVED_KEY));

        Ok(Markup::element("section")
            .class("archives")
            .child(Markup::element("h1").child(Markup::text("Archives")))
            .child(Markup::element("ul").children(archived.iter().map(note_link)))
            .child(
                Markup::element("a")
                    .class(NAV_CLASS)
                    .attr("href", "/")
                    .child(Markup::text("Back")),
            ))
    }
}

/// Everything the demo wires together at startup
pub struct DemoApp {
    pub document: Document,
    pub history: Rc<RefCell<History>>,
    pub store: Rc<RefCell<Store>>,
    pub router: Router,
    pub preferences: Preferences,
}

impl DemoApp {
    /// Build the document shell, initialize store and preferences, and
    /// bring up the router over the sample routes
    pub fn bootstrap(
        backend: impl StorageBackend + 'static,
        initial_path: &str,
    ) -> anyhow::Result<Self> {
        let document = Document::new();
        document
            .body()
            .append_markup(&Markup::element("div").class(APP_ROOT_CLASS));
        let app = document
            .find_by_class(APP_ROOT_CLASS)
            .context("application shell missing")?;

        let history = Rc::new(RefCell::new(History::new(initial_path)));

        let mut store = Store::new(backend);
        let initial = [
            (NOTES_KEY.to_string(), notes_to_value(&sample_notes())?),
            (ARCHIVED_KEY.to_string(), notes_to_value(&[])?),
        ]
        .into_iter()
        .collect();
        store.init(initial, "store");
        let store = Rc::new(RefCell::new(store));

        store.borrow_mut().subscribe(|state| {
            debug!(entries = state.len(), "store updated");
            Ok(())
        });

        let mut preferences = Preferences::new(&document, Rc::clone(&store), true);
        preferences.init();

        let routes = vec![
            Route::new(
                "/",
                Component::new(app.clone(), NotesView { store: Rc::clone(&store) })?,
            ),
            Route::new(
                "/archives",
                Component::new(app.clone(), ArchiveView { store: Rc::clone(&store) })?,
            ),
            Route::new(
                "/note/:title",
                Component::new(app.clone(), NoteView { store: Rc::clone(&store) })?,
            ),
        ];
        for route in &routes {
            debug!(path = route.path(), "registering route");
        }

        let mut router = Router::new(&document, Rc::clone(&history))?;
        router.init(routes);
        info!(path = initial_path, "demo application started");

        Ok(Self {
            document,
            history,
            store,
            router,
            preferences,
        })
    }

    /// Feed one host event to its handler
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Activation { target } => {
                // Component listeners hear the click first (bubbling), then
                // the delegated navigation handler resolves it
                target.dispatch("click");
                self.router.handle_activation(&target);
            }
            HostEvent::HistoryChange { entry } => {
                self.router.handle_history_change(entry.as_ref());
            }
            HostEvent::StorageChange(event) => {
                self.store.borrow_mut().handle_storage_change(&event);
            }
            HostEvent::ColorSchemeChange { dark } => {
                self.preferences.handle_scheme_change(dark);
            }
        }
    }

    /// The rendered document, for printing between demo steps
    pub fn render_html(&self) -> String {
        self.document.body().to_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_bootstrap_mounts_notes_index() {
        let app = DemoApp::bootstrap(MemoryStorage::new(), "/").unwrap();
        let html = app.render_html();
        assert!(html.contains("Notes"));
        assert!(html.contains("Japanese Cooking"));
    }

    #[test]
    fn test_note_link_activation_shows_note_body() {
        let mut app = DemoApp::bootstrap(MemoryStorage::new(), "/").unwrap();

        let link = app
            .document
            .find_by_class(NAV_CLASS)
            .expect("notes index renders nav links");
        assert_eq!(link.attribute("href").as_deref(), Some("/note/Japanese%20Cooking"));

        app.handle_event(HostEvent::Activation { target: link });
        let html = app.render_html();
        assert!(html.contains("Dashi first"));
    }

    #[test]
    fn test_add_note_button_writes_through_store() {
        let mut app = DemoApp::bootstrap(MemoryStorage::new(), "/").unwrap();
        let button = app.document.find_by_class("add-note").unwrap();

        app.handle_event(HostEvent::Activation { target: button });

        let store = app.store.borrow();
        let notes = notes_from_state(store.get_state(NOTES_KEY));
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[2].title, "Untitled 3");
    }

    #[test]
    fn test_persisted_notes_survive_restart() {
        let backend = MemoryStorage::new();
        {
            let mut app = DemoApp::bootstrap(backend.clone(), "/").unwrap();
            let button = app.document.find_by_class("add-note").unwrap();
            app.handle_event(HostEvent::Activation { target: button });
        }

        // Second launch over the same backend: snapshot wins over samples
        let app = DemoApp::bootstrap(backend, "/").unwrap();
        let store = app.store.borrow();
        assert_eq!(notes_from_state(store.get_state(NOTES_KEY)).len(), 3);
    }
}
