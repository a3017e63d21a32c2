// Component lifecycle - the contract every view implements
//
// Views are pure template producers behind the `View` trait; `Component`
// wraps one with the machinery shared by all of them: the mount container,
// the state bag set at mount time, and event-binding bookkeeping so a
// navigation away from a view leaves zero dangling listeners. Lifecycle
// errors never escape `mount`/`unmount` - they are logged and the container
// is put into a user-visible error rendering, which is what lets the router
// always proceed after a mount attempt.

use crate::dom::{EventHandler, ListenerOptions, Markup, NodeHandle};
use crate::error::FrameworkError;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Parameters passed at mount time; becomes the component's `state` bag
pub type Params = BTreeMap<String, String>;

/// A view: a pure rendering function plus optional lifecycle hooks.
///
/// `render` must be a pure function of the state bag - register interactive
/// bindings in `after_mount`, not during rendering. All hooks default to
/// no-ops; return an `Err` to signal a lifecycle failure (it will be
/// contained by the component, never propagated).
pub trait View {
    /// Name used in log messages
    fn name(&self) -> &'static str {
        "view"
    }

    /// Produce the markup for the current state
    fn render(&self, state: &Params) -> anyhow::Result<Markup>;

    /// Runs before the state bag is replaced and the view renders
    fn before_mount(&mut self, _scope: &mut ViewScope) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after rendering; the place to register event bindings
    fn after_mount(&mut self, _scope: &mut ViewScope) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before bindings are released and the container is cleared
    fn before_unmount(&mut self, _scope: &mut ViewScope) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the container has been cleared
    fn after_unmount(&mut self, _scope: &mut ViewScope) -> anyhow::Result<()> {
        Ok(())
    }
}

struct Binding {
    target: NodeHandle,
    event_type: String,
    handler: EventHandler,
}

/// The per-component surface hooks operate on: the container, the state
/// bag, and the bindings ledger. Composed into every component rather than
/// inherited.
pub struct ViewScope {
    container: NodeHandle,
    state: Params,
    bindings: Vec<Binding>,
}

impl ViewScope {
    /// The mount container
    pub fn container(&self) -> &NodeHandle {
        &self.container
    }

    /// The params this component was mounted with
    pub fn state(&self) -> &Params {
        &self.state
    }

    /// First rendered element carrying the given class, scoped to the
    /// container subtree
    pub fn find(&self, class: &str) -> Option<NodeHandle> {
        self.container.find_by_class(class)
    }

    /// Register an event binding for automatic release at unmount.
    /// The target must be an element node.
    pub fn register_event_listener(
        &mut self,
        target: &NodeHandle,
        event_type: &str,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> Result<(), FrameworkError> {
        if !target.is_element() {
            return Err(FrameworkError::InvalidBinding(
                "event target must be an element".to_string(),
            ));
        }

        target.add_listener(event_type, handler.clone(), options);
        self.bindings.push(Binding {
            target: target.clone(),
            event_type: event_type.to_string(),
            handler,
        });
        Ok(())
    }

    /// Release one binding by handler identity; reports whether a matching
    /// binding was found and removed
    pub fn remove_event_listener(
        &mut self,
        target: &NodeHandle,
        event_type: &str,
        handler: &EventHandler,
    ) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|binding| {
            !(binding.target.ptr_eq(target)
                && binding.event_type == event_type
                && std::rc::Rc::ptr_eq(&binding.handler, handler))
        });
        if self.bindings.len() == before {
            return false;
        }

        target.remove_listener(event_type, handler);
        true
    }

    /// Number of live bindings attributable to this component
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    fn release_all(&mut self) {
        for binding in self.bindings.drain(..) {
            binding
                .target
                .remove_listener(&binding.event_type, &binding.handler);
        }
    }
}

/// A view mounted into a container, with lifecycle and binding bookkeeping
pub struct Component {
    scope: ViewScope,
    view: Box<dyn View>,
}

impl Component {
    /// Wrap a view over its mount container. The container must be an
    /// element node.
    pub fn new(container: NodeHandle, view: impl View + 'static) -> Result<Self, FrameworkError> {
        if !container.is_element() {
            return Err(FrameworkError::InvalidContainer(
                "container must be an element".to_string(),
            ));
        }

        Ok(Self {
            scope: ViewScope {
                container,
                state: Params::new(),
                bindings: Vec::new(),
            },
            view: Box::new(view),
        })
    }

    /// Mount: before-hook, replace the state bag, render into the container
    /// wholesale, after-hook. Errors anywhere in the sequence are contained.
    pub fn mount(&mut self, params: Params) {
        debug!(view = self.view.name(), "mounting component");
        if let Err(err) = self.try_mount(params) {
            self.contain(&err, "mounting");
        }
    }

    /// Unmount: before-hook, release every binding, clear the container,
    /// after-hook. Errors are contained the same way as during mount.
    pub fn unmount(&mut self) {
        debug!(view = self.view.name(), "unmounting component");
        if let Err(err) = self.try_unmount() {
            self.contain(&err, "unmounting");
        }
    }

    /// The params this component was last mounted with
    pub fn state(&self) -> &Params {
        &self.scope.state
    }

    /// Number of live bindings attributable to this component
    pub fn binding_count(&self) -> usize {
        self.scope.binding_count()
    }

    /// The mount container
    pub fn container(&self) -> &NodeHandle {
        self.scope.container()
    }

    fn try_mount(&mut self, params: Params) -> anyhow::Result<()> {
        self.view.before_mount(&mut self.scope)?;

        self.scope.state = params;
        let markup = self.view.render(&self.scope.state)?;
        self.scope.container.replace_children(&markup);

        self.view.after_mount(&mut self.scope)
    }

    fn try_unmount(&mut self) -> anyhow::Result<()> {
        self.view.before_unmount(&mut self.scope)?;

        self.scope.release_all();
        self.scope.container.clear_children();

        self.view.after_unmount(&mut self.scope)
    }

    /// Contain a lifecycle error: log it, drop any bindings the failed
    /// sequence left behind, and put the container into an error rendering
    /// instead of a corrupted partial one
    fn contain(&mut self, err: &anyhow::Error, phase: &str) {
        error!(view = self.view.name(), phase, %err, "error during component lifecycle");
        self.scope.release_all();
        self.scope.container.replace_children(&error_markup());
    }
}

fn error_markup() -> Markup {
    Markup::element("div")
        .class("error-component")
        .child(Markup::element("p").child(Markup::text("An unexpected error occurred.")))
}
