// In-memory document model - the host render surface
//
// The framework targets an element tree rather than a live browser DOM:
// opaque node handles, attribute and class access, wholesale child
// replacement, per-element event listeners, and bubbling dispatch. The tree
// is single-threaded; handles are reference-counted with parent weak links
// so subtrees drop when detached.

mod markup;

pub use markup::Markup;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// An event delivered to element listeners
#[derive(Clone)]
pub struct Event {
    /// Event type, e.g. `"click"` or `"input"`
    pub event_type: String,
    /// The node the event was dispatched on (dispatch bubbles upward from here)
    pub target: NodeHandle,
}

/// Callback invoked when a matching event reaches an element.
///
/// Identity matters: bindings are released by `Rc::ptr_eq` on the handler,
/// so keep a clone of the `Rc` around to remove a listener individually.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Listener registration options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Remove the listener after its first invocation
    pub once: bool,
}

struct Listener {
    event_type: String,
    handler: EventHandler,
    once: bool,
}

enum NodeData {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        listeners: Vec<Listener>,
        children: Vec<NodeHandle>,
        parent: Weak<RefCell<NodeData>>,
    },
    Text {
        content: String,
        parent: Weak<RefCell<NodeData>>,
    },
}

/// Opaque handle to a node in the document tree
#[derive(Clone)]
pub struct NodeHandle(Rc<RefCell<NodeData>>);

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.borrow() {
            NodeData::Element { tag, attributes, .. } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attributes", attributes)
                .finish_non_exhaustive(),
            NodeData::Text { content, .. } => f.debug_tuple("Text").field(content).finish(),
        }
    }
}

impl NodeHandle {
    /// Create a detached element node
    pub fn new_element(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(NodeData::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    /// Create a detached text node
    pub fn new_text(content: &str) -> Self {
        Self(Rc::new(RefCell::new(NodeData::Text {
            content: content.to_string(),
            parent: Weak::new(),
        })))
    }

    /// Whether this node is an element (a valid render target)
    pub fn is_element(&self) -> bool {
        matches!(&*self.0.borrow(), NodeData::Element { .. })
    }

    /// Element tag name, `None` for text nodes
    pub fn tag(&self) -> Option<String> {
        match &*self.0.borrow() {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text { .. } => None,
        }
    }

    /// Attribute value, `None` for missing attributes and text nodes
    pub fn attribute(&self, name: &str) -> Option<String> {
        match &*self.0.borrow() {
            NodeData::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeData::Text { .. } => None,
        }
    }

    /// Set an attribute; ignored on text nodes
    pub fn set_attribute(&self, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut *self.0.borrow_mut() {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Whether the `class` attribute contains the given class
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match &*self.0.borrow() {
            NodeData::Text { content, .. } => content.clone(),
            NodeData::Element { children, .. } => {
                children.iter().map(NodeHandle::text_content).collect()
            }
        }
    }

    /// Parent node, if attached
    pub fn parent(&self) -> Option<NodeHandle> {
        let parent = match &*self.0.borrow() {
            NodeData::Element { parent, .. } => parent.clone(),
            NodeData::Text { parent, .. } => parent.clone(),
        };
        parent.upgrade().map(NodeHandle)
    }

    /// Child nodes (empty for text nodes)
    pub fn children(&self) -> Vec<NodeHandle> {
        match &*self.0.borrow() {
            NodeData::Element { children, .. } => children.clone(),
            NodeData::Text { .. } => Vec::new(),
        }
    }

    /// Handle identity - two handles referring to the same node
    pub fn ptr_eq(&self, other: &NodeHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Nearest ancestor-or-self element carrying the given class.
    ///
    /// This is what makes delegated navigation work: an activation on markup
    /// nested inside a nav element still resolves to the nav element.
    pub fn closest_with_class(&self, class: &str) -> Option<NodeHandle> {
        let mut node = Some(self.clone());
        while let Some(current) = node {
            if current.is_element() && current.has_class(class) {
                return Some(current);
            }
            node = current.parent();
        }
        None
    }

    /// First descendant element (depth-first) carrying the given class
    pub fn find_by_class(&self, class: &str) -> Option<NodeHandle> {
        for child in self.children() {
            if child.is_element() && child.has_class(class) {
                return Some(child);
            }
            if let Some(found) = child.find_by_class(class) {
                return Some(found);
            }
        }
        None
    }

    /// Instantiate markup and append it as the last child.
    /// Returns the created node; ignored (returns a detached node) on text nodes.
    pub fn append_markup(&self, markup: &Markup) -> NodeHandle {
        let node = instantiate(markup, Rc::downgrade(&self.0));
        if let NodeData::Element { children, .. } = &mut *self.0.borrow_mut() {
            children.push(node.clone());
        }
        node
    }

    /// Replace all children with the instantiation of the given markup.
    /// This is the wholesale-substitution render step; there is no diffing.
    pub fn replace_children(&self, markup: &Markup) {
        let node = instantiate(markup, Rc::downgrade(&self.0));
        if let NodeData::Element { children, .. } = &mut *self.0.borrow_mut() {
            children.clear();
            children.push(node);
        }
    }

    /// Remove all children
    pub fn clear_children(&self) {
        if let NodeData::Element { children, .. } = &mut *self.0.borrow_mut() {
            children.clear();
        }
    }

    /// Register an event listener; ignored on text nodes (callers validate
    /// targets through the component layer)
    pub fn add_listener(&self, event_type: &str, handler: EventHandler, options: ListenerOptions) {
        if let NodeData::Element { listeners, .. } = &mut *self.0.borrow_mut() {
            listeners.push(Listener {
                event_type: event_type.to_string(),
                handler,
                once: options.once,
            });
        }
    }

    /// Remove one listener by handler identity; reports whether one was found
    pub fn remove_listener(&self, event_type: &str, handler: &EventHandler) -> bool {
        if let NodeData::Element { listeners, .. } = &mut *self.0.borrow_mut() {
            let before = listeners.len();
            listeners.retain(|listener| {
                !(listener.event_type == event_type && Rc::ptr_eq(&listener.handler, handler))
            });
            return listeners.len() < before;
        }
        false
    }

    /// Dispatch an event on this node, bubbling to the document root.
    ///
    /// Matching handlers are snapshotted before any of them run, so a
    /// handler may freely mutate the tree (including removing listeners)
    /// without invalidating the dispatch in progress.
    pub fn dispatch(&self, event_type: &str) {
        let event = Event {
            event_type: event_type.to_string(),
            target: self.clone(),
        };

        let mut chain = vec![self.clone()];
        let mut node = self.parent();
        while let Some(current) = node {
            node = current.parent();
            chain.push(current);
        }

        for current in chain {
            let matching: Vec<(EventHandler, bool)> = match &*current.0.borrow() {
                NodeData::Element { listeners, .. } => listeners
                    .iter()
                    .filter(|l| l.event_type == event_type)
                    .map(|l| (Rc::clone(&l.handler), l.once))
                    .collect(),
                NodeData::Text { .. } => Vec::new(),
            };

            for (handler, once) in matching {
                handler(&event);
                if once {
                    current.remove_listener(event_type, &handler);
                }
            }
        }
    }

    /// Render the subtree as indented HTML-ish text (demo output, debugging)
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, 0);
        out
    }

    fn write_html(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match &*self.0.borrow() {
            NodeData::Text { content, .. } => {
                out.push_str(&indent);
                out.push_str(content);
                out.push('\n');
            }
            NodeData::Element {
                tag,
                attributes,
                children,
                ..
            } => {
                out.push_str(&indent);
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, value));
                }
                if children.is_empty() {
                    out.push_str("/>\n");
                    return;
                }
                out.push_str(">\n");
                for child in children {
                    child.write_html(out, depth + 1);
                }
                out.push_str(&format!("{}</{}>\n", indent, tag));
            }
        }
    }
}

fn instantiate(markup: &Markup, parent: Weak<RefCell<NodeData>>) -> NodeHandle {
    match markup {
        Markup::Text(content) => NodeHandle(Rc::new(RefCell::new(NodeData::Text {
            content: content.clone(),
            parent,
        }))),
        Markup::Element {
            tag,
            attributes,
            children,
        } => {
            let node = NodeHandle(Rc::new(RefCell::new(NodeData::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                listeners: Vec::new(),
                children: Vec::new(),
                parent,
            })));
            let child_nodes: Vec<NodeHandle> = children
                .iter()
                .map(|child| instantiate(child, Rc::downgrade(&node.0)))
                .collect();
            if let NodeData::Element { children, .. } = &mut *node.0.borrow_mut() {
                *children = child_nodes;
            }
            node
        }
    }
}

/// The host document: a `body` root that applications build their shell into
pub struct Document {
    body: NodeHandle,
}

impl Document {
    /// Create a document with an empty body
    pub fn new() -> Self {
        Self {
            body: NodeHandle::new_element("body"),
        }
    }

    /// The document body (where the theme service applies preferences)
    pub fn body(&self) -> NodeHandle {
        self.body.clone()
    }

    /// First element in the document carrying the given class
    pub fn find_by_class(&self, class: &str) -> Option<NodeHandle> {
        self.body.find_by_class(class)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample_tree() -> Document {
        let doc = Document::new();
        doc.body().append_markup(
            &Markup::element("div").class("app").child(
                Markup::element("a")
                    .class("app-nav")
                    .attr("href", "/archives")
                    .child(Markup::element("span").child(Markup::text("Archives"))),
            ),
        );
        doc
    }

    #[test]
    fn test_find_by_class_searches_descendants() {
        let doc = sample_tree();
        let app = doc.find_by_class("app").expect("app root");
        assert_eq!(app.tag().as_deref(), Some("div"));
        assert!(doc.find_by_class("missing").is_none());
    }

    #[test]
    fn test_closest_walks_up_from_nested_markup() {
        let doc = sample_tree();
        let span = doc.find_by_class("app").unwrap().children()[0].children()[0].clone();
        assert_eq!(span.tag().as_deref(), Some("span"));

        let nav = span.closest_with_class("app-nav").expect("nav ancestor");
        assert_eq!(nav.attribute("href").as_deref(), Some("/archives"));
    }

    #[test]
    fn test_replace_children_is_wholesale() {
        let doc = sample_tree();
        let app = doc.find_by_class("app").unwrap();
        app.replace_children(&Markup::element("p").child(Markup::text("replaced")));

        let children = app.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text_content(), "replaced");
    }

    #[test]
    fn test_dispatch_bubbles_and_respects_once() {
        let doc = sample_tree();
        let nav = doc.find_by_class("app").unwrap().children()[0].clone();
        let span = nav.children()[0].clone();

        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let handler: EventHandler = Rc::new(move |event: &Event| {
            assert_eq!(event.event_type, "click");
            seen.set(seen.get() + 1);
        });

        nav.add_listener("click", Rc::clone(&handler), ListenerOptions { once: true });
        span.dispatch("click");
        span.dispatch("click");
        assert_eq!(count.get(), 1, "once-listener fires a single time");
    }

    #[test]
    fn test_remove_listener_by_identity() {
        let doc = sample_tree();
        let nav = doc.find_by_class("app").unwrap().children()[0].clone();

        let first: EventHandler = Rc::new(|_| {});
        let second: EventHandler = Rc::new(|_| {});
        nav.add_listener("click", Rc::clone(&first), ListenerOptions::default());

        assert!(!nav.remove_listener("click", &second));
        assert!(nav.remove_listener("click", &first));
        assert!(!nav.remove_listener("click", &first));
    }

    #[test]
    fn test_text_content_concatenates() {
        let doc = sample_tree();
        let app = doc.find_by_class("app").unwrap();
        assert_eq!(app.text_content(), "Archives");
    }
}
