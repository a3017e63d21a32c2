// Markup values - what a view's render function produces
//
// A `Markup` tree is inert data: no parent links, no listeners. It becomes
// live nodes only when a container adopts it via `replace_children`, which
// is the framework's whole-subtree replacement step.

use std::collections::BTreeMap;

/// A fragment of renderable markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// An element with attributes and child fragments
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<Markup>,
    },
    /// A text fragment
    Text(String),
}

impl Markup {
    /// Start an element fragment
    pub fn element(tag: &str) -> Self {
        Self::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// A text fragment
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Set an attribute (builder style); no-op on text fragments
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Append a class to the `class` attribute
    pub fn class(mut self, value: &str) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes
                .entry("class".to_string())
                .and_modify(|classes| {
                    classes.push(' ');
                    classes.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        self
    }

    /// Append a child fragment
    pub fn child(mut self, child: Markup) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Append several child fragments
    pub fn children(mut self, iter: impl IntoIterator<Item = Markup>) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.extend(iter);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_builder_appends() {
        let markup = Markup::element("a").class("app-nav").class("active");
        match markup {
            Markup::Element { attributes, .. } => {
                assert_eq!(attributes.get("class").map(String::as_str), Some("app-nav active"));
            }
            Markup::Text(_) => panic!("expected element"),
        }
    }

    #[test]
    fn test_attr_ignored_on_text() {
        let markup = Markup::text("hello").attr("href", "/");
        assert_eq!(markup, Markup::Text("hello".to_string()));
    }
}
