//! Abstract document tree
//!
//! [`DocumentTree`] is the only view of the rendered document the engine
//! relies on: node enumeration, text read/replace, attribute read/write,
//! fragment splicing and a mutation subscription. Any concrete tree API can
//! sit behind it; [`crate::ArenaDocument`] is the in-memory implementation.

use crate::error::TreeError;
use crate::location::Location;
use std::fmt::{self, Display, Formatter};
use tokio::sync::mpsc;

/// Opaque node handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Handle from a backend-specific index
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Backend-specific index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element with a tag name, attributes and children
    Element,
    /// Leaf holding text
    Text,
}

/// Content spliced into the tree in place of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Plain text node
    Text(String),
    /// Element holding a single text child
    Element {
        /// Tag name
        tag: String,
        /// Attributes in order
        attributes: Vec<(String, String)>,
        /// Text of the only child
        text: String,
    },
}

impl Fragment {
    /// Plain text fragment
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// What changed in a [`MutationRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// A node (and its subtree) was inserted
    ChildAdded,
    /// A text node's content changed
    TextChanged,
    /// A node was detached
    ChildRemoved,
}

/// One structural or text change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Change kind
    pub kind: MutationKind,
    /// Affected node
    pub target: NodeId,
    /// Text content of the affected node when the change happened
    pub text: String,
}

/// Live, externally mutated document tree
///
/// Attribute writes are not reported to observers; child insertions,
/// removals and text changes are.
pub trait DocumentTree {
    /// Document root element
    fn root(&self) -> NodeId;

    /// Kind of `node`, `None` if unknown
    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Parent of `node` (`None` for the root and detached nodes)
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lower-case tag name of an element
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Attribute value of an element
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Set an attribute on an element
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] or [`TreeError::NotElement`]
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), TreeError>;

    /// Remove an attribute from an element (no-op when absent)
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] or [`TreeError::NotElement`]
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), TreeError>;

    /// Content of a text node
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Replace the content of a text node
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] or [`TreeError::NotText`]
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError>;

    /// Replace `node` with `fragments`, returning the new node ids in order
    ///
    /// # Errors
    /// Fails for unknown, detached or root nodes
    fn replace_with(&mut self, node: NodeId, fragments: Vec<Fragment>)
        -> Result<Vec<NodeId>, TreeError>;

    /// Detach `node` from its parent
    ///
    /// # Errors
    /// Fails for unknown, detached or root nodes
    fn remove(&mut self, node: NodeId) -> Result<(), TreeError>;

    /// Document title
    fn title(&self) -> &str;

    /// Replace the document title
    fn set_title(&mut self, title: &str);

    /// Current location
    fn location(&self) -> Location;

    /// Subscribe to child/text mutations
    ///
    /// A new subscription replaces any previous one.
    fn observe(&mut self) -> mpsc::UnboundedReceiver<MutationRecord>;

    /// Whether `node` is an element
    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    /// Whether `node` is a text node
    fn is_text(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Text)
    }

    /// Whether the element's `class` attribute lists `class`
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Sibling immediately before `node`
    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&n| n == node)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    /// Sibling immediately after `node`
    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&n| n == node)?;
        siblings.get(pos + 1).copied()
    }

    /// Ancestors from the parent up to the root
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(n) = current {
            out.push(n);
            current = self.parent(n);
        }
        out
    }

    /// Whether `node` is reachable from the root
    fn is_connected(&self, node: NodeId) -> bool {
        node == self.root() || self.ancestors(node).last() == Some(&self.root())
    }

    /// Descendants of `node` in document order, excluding `node`
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).into_iter().rev());
        }
        out
    }

    /// Concatenated text of `node` and its descendants
    fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.text(node) {
            return text.to_string();
        }
        let mut out = String::new();
        for n in self.descendants(node) {
            if let Some(text) = self.text(n) {
                out.push_str(text);
            }
        }
        out
    }
}
