//! Schema-agnostic DOM → nested mapping conversion.
//!
//! Every element becomes a [`Node`]; its attributes and child elements share
//! one key space. A key holds a single node until a second sibling with the
//! same tag shows up, at which point it is promoted to a list (see
//! [`Entry::absorb`]). A handful of tags are lists from the first occurrence.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

use crate::dom::{DomNode, Element};

/// Key under which non-whitespace text content is stored.
pub const TEXT_KEY: &str = "value";

/// Tags that always map to a list, even with a single occurrence.
pub const LIST_TAGS: [&str; 5] = ["name", "custom", "colour", "categories", "blocks"];

/// One value in a [`Node`]'s key space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    /// Attribute value or text content.
    Text(String),
    /// A single child element.
    Node(Node),
    /// Repeated (or always-listed) child elements in document order.
    List(Vec<Node>),
}

impl Entry {
    /// Entry for the first `tag` element seen under a parent: a one-element
    /// `List` for [`LIST_TAGS`], otherwise a single `Node`.
    pub fn first_child(tag: &str, node: Node) -> Self {
        if LIST_TAGS.contains(&tag) {
            Entry::List(vec![node])
        } else {
            Entry::Node(node)
        }
    }

    /// Merge another `tag` element into the entry already stored under `tag`.
    ///
    /// `Node` → `List` of both, `List` → appended. A `Text` entry (an
    /// attribute or text value under the same key) is overwritten and the
    /// element starts over as [`Entry::first_child`]. Once an entry is a
    /// `List` it stays one.
    pub fn absorb(&mut self, tag: &str, node: Node) {
        let previous = std::mem::replace(self, Entry::List(Vec::new()));
        *self = match previous {
            Entry::List(mut nodes) => {
                nodes.push(node);
                Entry::List(nodes)
            }
            Entry::Node(first) => Entry::List(vec![first, node]),
            Entry::Text(_) => Entry::first_child(tag, node),
        };
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Entry::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The element(s) behind this entry: one for `Node`, all for `List`,
    /// none for `Text`.
    pub fn nodes(&self) -> std::slice::Iter<'_, Node> {
        match self {
            Entry::Node(node) => std::slice::from_ref(node).iter(),
            Entry::List(nodes) => nodes.iter(),
            Entry::Text(_) => <&[Node]>::default().iter(),
        }
    }
}

/// Generic mapping for one element: attributes, child elements and text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Node {
    entries: IndexMap<String, Entry>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// String value stored under `key` (attribute or text).
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Entry::as_text)
    }

    /// Text content of this element, if it had any non-whitespace text.
    pub fn value(&self) -> Option<&str> {
        self.text(TEXT_KEY)
    }

    /// Child elements stored under `key`, in document order.
    pub fn children<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.get(key).into_iter().flat_map(Entry::nodes)
    }

    /// First child element stored under `key`.
    pub fn first(&self, key: &str) -> Option<&Node> {
        self.children(key).next()
    }

    pub fn has_children(&self, key: &str) -> bool {
        self.first(key).is_some()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set a string entry, overwriting whatever was stored under `key`.
    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Entry::Text(value.into()));
    }

    /// Add a child element under `tag`, applying the promotion rules.
    pub fn insert_child(&mut self, tag: &str, child: Node) {
        match self.entries.get_mut(tag) {
            Some(existing) => existing.absorb(tag, child),
            None => {
                self.entries
                    .insert(tag.to_string(), Entry::first_child(tag, child));
            }
        }
    }
}

/// Flatten a document element.
///
/// The returned node is a wrapper holding a single entry keyed by the root's
/// tag, so `<xml>…</xml>` ends up under `flatten(&root).first("xml")`.
pub fn flatten(root: &Element) -> Node {
    let mut document = Node::new();
    flatten_element(root, &mut document);
    document
}

fn flatten_element(element: &Element, parent: &mut Node) {
    let mut node = Node::new();
    for (key, value) in &element.attributes {
        node.insert_text(key.as_str(), value.as_str());
    }
    for child in &element.children {
        match child {
            DomNode::Element(child) => flatten_element(child, &mut node),
            DomNode::Text(text) => {
                if !text.trim().is_empty() {
                    node.insert_text(TEXT_KEY, text.as_str());
                }
            }
        }
    }
    trace!(tag = %element.name, keys = node.len(), "flattened element");
    parent.insert_child(&element.name, node);
}
