// End-to-end routing scenario over the public API: a Home view and a
// parameterized Note view, exercised through navigation, activation,
// history replay, and the not-found fallback.

use std::cell::RefCell;
use std::rc::Rc;
use trellis::{
    Component, Document, History, Markup, Params, Route, Router, View,
};

struct HomeView;

impl View for HomeView {
    fn name(&self) -> &'static str {
        "home"
    }

    fn render(&self, _state: &Params) -> anyhow::Result<Markup> {
        Ok(Markup::element("section").class("home").child(
            Markup::element("a")
                .class("app-nav")
                .attr("href", "/note/Japanese%20Cooking")
                .child(Markup::element("strong").child(Markup::text("Japanese Cooking"))),
        ))
    }
}

struct NoteView;

impl View for NoteView {
    fn name(&self) -> &'static str {
        "note"
    }

    fn render(&self, state: &Params) -> anyhow::Result<Markup> {
        let title = state.get("title").cloned().unwrap_or_default();
        Ok(Markup::element("article")
            .class("note")
            .child(Markup::element("h1").child(Markup::text(title))))
    }
}

struct Fixture {
    document: Document,
    history: Rc<RefCell<History>>,
    router: Router,
}

fn fixture() -> Fixture {
    let document = Document::new();
    document
        .body()
        .append_markup(&Markup::element("div").class("app"));
    let app = document.find_by_class("app").unwrap();
    let history = Rc::new(RefCell::new(History::new("/")));

    let mut router = Router::new(&document, Rc::clone(&history)).unwrap();
    router.init(vec![
        Route::new("/", Component::new(app.clone(), HomeView).unwrap()),
        Route::new("/note/:title", Component::new(app, NoteView).unwrap()),
    ]);

    Fixture {
        document,
        history,
        router,
    }
}

#[test]
fn navigating_to_note_extracts_raw_title_param() {
    let mut fixture = fixture();
    fixture.router.navigate("/note/Japanese%20Cooking", true);

    let current = fixture.router.current_component().expect("note is active");
    assert_eq!(
        current.borrow().state().get("title").map(String::as_str),
        Some("Japanese%20Cooking")
    );
    assert!(fixture
        .document
        .body()
        .to_html()
        .contains("Japanese%20Cooking"));
}

#[test]
fn unknown_path_mounts_not_found_view() {
    let mut fixture = fixture();
    fixture.router.navigate("/unknown", true);

    assert!(fixture.document.find_by_class("not-found").is_some());
    assert!(fixture.router.current_component().is_none());
}

#[test]
fn activation_inside_nav_link_navigates_once() {
    let mut fixture = fixture();
    let nav = fixture.document.find_by_class("app-nav").unwrap();
    let nested = nav.children()[0].clone();

    fixture.router.handle_activation(&nested);

    assert!(fixture.document.find_by_class("note").is_some());
    assert_eq!(fixture.history.borrow().len(), 2, "exactly one push");
    assert_eq!(fixture.router.current_path(), "/note/Japanese%20Cooking");
}

#[test]
fn back_and_forward_replay_without_pushing() {
    let mut fixture = fixture();
    fixture.router.navigate("/note/Japanese%20Cooking", true);

    let entry = fixture.history.borrow_mut().back();
    fixture.router.handle_history_change(entry.as_ref());
    assert!(fixture.document.find_by_class("home").is_some());

    let entry = fixture.history.borrow_mut().forward();
    fixture.router.handle_history_change(entry.as_ref());
    assert!(fixture.document.find_by_class("note").is_some());

    assert_eq!(fixture.history.borrow().len(), 2, "replay never pushes");
}
