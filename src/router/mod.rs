// Client-side router - path matching, history integration, navigation
//
// Holds the route table, decides which component is active for the current
// path, and replays history moves without re-pushing entries. Matching is
// exact-first: a literal route always beats a parameterized pattern that
// would also match, regardless of registration order; parameterized routes
// are then tried in registration order with a pairwise segment walk. A path
// that matches nothing is not an error - it degrades to the built-in
// not-found view.

use crate::component::{Component, Params, View};
use crate::dom::{Document, Markup, NodeHandle};
use crate::error::FrameworkError;
use crate::history::{History, HistoryEntry};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Class marking the application root element
pub const APP_ROOT_CLASS: &str = "app";

/// Class marking elements whose activation is in-app navigation
pub const NAV_CLASS: &str = "app-nav";

/// Leading marker of a parameter segment in a route pattern
const PARAM_PREFIX: char = ':';

/// A path pattern bound to a component
pub struct Route {
    path: String,
    component: Rc<RefCell<Component>>,
}

impl Route {
    /// Bind a pattern like `/note/:title` to a component. Parameter
    /// segments start with `:`; everything else matches literally.
    pub fn new(path: &str, component: Component) -> Self {
        Self {
            path: path.to_string(),
            component: Rc::new(RefCell::new(component)),
        }
    }

    /// The route's path pattern
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Orchestrates which component is mounted for the current path
pub struct Router {
    app_root: NodeHandle,
    history: Rc<RefCell<History>>,
    routes: Vec<Route>,
    not_found: Component,
    current: Option<Rc<RefCell<Component>>>,
    initialized: bool,
}

impl Router {
    /// Create a router over the document's application root. Fatal if the
    /// document has no element carrying the `app` class.
    pub fn new(
        document: &Document,
        history: Rc<RefCell<History>>,
    ) -> Result<Self, FrameworkError> {
        let app_root = document
            .find_by_class(APP_ROOT_CLASS)
            .ok_or(FrameworkError::MountPointNotFound)?;
        let not_found = Component::new(app_root.clone(), NotFoundView)?;

        Ok(Self {
            app_root,
            history,
            routes: Vec::new(),
            not_found,
            current: None,
            initialized: false,
        })
    }

    /// Store the route table and resolve the current path immediately,
    /// without pushing a history entry (the current path already is one).
    /// Re-initialization is a no-op.
    pub fn init(&mut self, routes: Vec<Route>) {
        if self.initialized {
            return;
        }

        self.routes = routes;
        self.initialized = true;

        let path = self.current_path();
        self.navigate(&path, false);
    }

    /// Whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Navigate to `path`: optionally push a history entry, unmount the
    /// active component, then mount the best match (or the not-found view)
    pub fn navigate(&mut self, path: &str, add_to_history: bool) {
        debug!(path, add_to_history, "navigating");

        if add_to_history {
            self.history.borrow_mut().push_state(path);
        }

        if let Some(current) = self.current.take() {
            current.borrow_mut().unmount();
        }

        let (matched, params) = self.find_matching_route(path);

        match matched {
            None => self.not_found.mount(Params::new()),
            Some(index) => {
                let component = Rc::clone(&self.routes[index].component);
                component.borrow_mut().mount(params);
                self.current = Some(component);
            }
        }
    }

    /// Path portion of the current location, query and fragment stripped
    pub fn current_path(&self) -> String {
        let location = self.history.borrow().location().to_string();
        let end = location
            .find(|c| c == '?' || c == '#')
            .unwrap_or(location.len());
        location[..end].to_string()
    }

    /// The component mounted by the last navigation, `None` when the
    /// not-found view is showing
    pub fn current_component(&self) -> Option<Rc<RefCell<Component>>> {
        self.current.clone()
    }

    /// Handle an activation event: walk up from the event target to the
    /// nearest in-app navigation element and navigate to its `href`, unless
    /// that path is already current
    pub fn handle_activation(&mut self, target: &NodeHandle) {
        let Some(nav) = target.closest_with_class(NAV_CLASS) else {
            return;
        };
        let Some(path) = nav.attribute("href") else {
            return;
        };

        if path != self.current_path() {
            self.navigate(&path, true);
        }
    }

    /// Handle a history back/forward move: take the path from the entry
    /// payload, falling back to the live location, and navigate without
    /// pushing a new entry
    pub fn handle_history_change(&mut self, entry: Option<&HistoryEntry>) {
        let path = entry
            .and_then(|e| e.state.clone())
            .unwrap_or_else(|| self.current_path());
        self.navigate(&path, false);
    }

    /// Find the best route for `path`: an exact pattern match wins with
    /// empty params; otherwise the first registered pattern whose segments
    /// all match, with `:name` segments capturing raw path segments.
    fn find_matching_route(&self, path: &str) -> (Option<usize>, Params) {
        if let Some(index) = self.routes.iter().position(|route| route.path == path) {
            return (Some(index), Params::new());
        }

        for (index, route) in self.routes.iter().enumerate() {
            if let Some(params) = match_pattern(&route.path, path) {
                return (Some(index), params);
            }
        }

        (None, Params::new())
    }
}

/// Walk pattern and path segments pairwise. Segment counts must agree;
/// `:name` captures the path segment verbatim (no decoding, no coercion);
/// literal segments must be equal.
fn match_pattern(pattern: &str, path: &str) -> Option<Params> {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = Params::new();
    for (pattern_segment, path_segment) in pattern_segments.iter().zip(&path_segments) {
        if let Some(name) = pattern_segment.strip_prefix(PARAM_PREFIX) {
            params.insert(name.to_string(), (*path_segment).to_string());
        } else if pattern_segment != path_segment {
            return None;
        }
    }

    Some(params)
}

/// Fallback view mounted when no route matches the current path
struct NotFoundView;

impl View for NotFoundView {
    fn name(&self) -> &'static str {
        "not-found"
    }

    fn render(&self, _state: &Params) -> anyhow::Result<Markup> {
        Ok(Markup::element("div")
            .class("not-found")
            .child(Markup::element("h1").child(Markup::text("404")))
            .child(Markup::element("p").child(Markup::text("Page not found."))))
    }
}
