//! In-memory [`DocumentTree`]
//!
//! Nodes live in a flat arena indexed by [`NodeId`]. Removed nodes stay in
//! the arena but lose their parent link, so stale handles fail with
//! [`TreeError::Detached`] instead of aliasing new nodes.

use crate::error::TreeError;
use crate::location::Location;
use crate::tree::{DocumentTree, Fragment, MutationKind, MutationRecord, NodeId, NodeKind};
use std::fmt::Write as _;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
enum Payload {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    payload: Payload,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document
#[derive(Debug)]
pub struct ArenaDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    title: String,
    location: Location,
    observer: Option<mpsc::UnboundedSender<MutationRecord>>,
}

impl ArenaDocument {
    /// Empty document with an `<html>` root
    #[must_use]
    pub fn new(location: Location) -> Self {
        let root = NodeData {
            payload: Payload::Element {
                tag: "html".to_string(),
                attributes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId::new(0),
            title: String::new(),
            location,
            observer: None,
        }
    }

    /// Set the title while building
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Append an element under `parent`
    ///
    /// # Errors
    /// Fails if `parent` is unknown or not an element
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<NodeId, TreeError> {
        let payload = Payload::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        };
        self.append(parent, payload)
    }

    /// Append a text node under `parent`
    ///
    /// # Errors
    /// Fails if `parent` is unknown or not an element
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, TreeError> {
        self.append(parent, Payload::Text(text.to_string()))
    }

    /// Simulate a navigation
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Serialize `node` and its subtree as HTML
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(node.index()) else {
            return;
        };
        match &data.payload {
            Payload::Text(text) => out.push_str(&escape(text, false)),
            Payload::Element { tag, attributes } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn append(&mut self, parent: NodeId, payload: Payload) -> Result<NodeId, TreeError> {
        self.element(parent)?;
        let id = self.alloc(payload, Some(parent));
        self.nodes[parent.index()].children.push(id);
        self.notify(MutationKind::ChildAdded, id);
        Ok(id)
    }

    fn alloc(&mut self, payload: Payload, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            payload,
            parent,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, node: NodeId) -> Result<&NodeData, TreeError> {
        self.nodes.get(node.index()).ok_or(TreeError::NodeNotFound(node))
    }

    fn element(&self, node: NodeId) -> Result<&NodeData, TreeError> {
        let data = self.node(node)?;
        match data.payload {
            Payload::Element { .. } => Ok(data),
            Payload::Text(_) => Err(TreeError::NotElement(node)),
        }
    }

    fn attributes_mut(&mut self, node: NodeId) -> Result<&mut Vec<(String, String)>, TreeError> {
        let data = self
            .nodes
            .get_mut(node.index())
            .ok_or(TreeError::NodeNotFound(node))?;
        match &mut data.payload {
            Payload::Element { attributes, .. } => Ok(attributes),
            Payload::Text(_) => Err(TreeError::NotElement(node)),
        }
    }

    /// Parent and position of an attached, non-root node
    fn slot(&self, node: NodeId) -> Result<(NodeId, usize), TreeError> {
        if node == self.root {
            return Err(TreeError::RootNode);
        }
        let parent = self.node(node)?.parent.ok_or(TreeError::Detached(node))?;
        let pos = self.nodes[parent.index()]
            .children
            .iter()
            .position(|&n| n == node)
            .ok_or(TreeError::Detached(node))?;
        Ok((parent, pos))
    }

    fn notify(&mut self, kind: MutationKind, target: NodeId) {
        let Some(observer) = &self.observer else {
            return;
        };
        let record = MutationRecord {
            kind,
            target,
            text: self.text_content(target),
        };
        if observer.send(record).is_err() {
            self.observer = None;
        }
    }
}

impl DocumentTree for ArenaDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(node.index()).map(|d| match d.payload {
            Payload::Element { .. } => NodeKind::Element,
            Payload::Text(_) => NodeKind::Text,
        })
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|d| d.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.index())
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.payload {
            Payload::Element { tag, .. } => Some(tag),
            Payload::Text(_) => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.index())?.payload {
            Payload::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Payload::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let attributes = self.attributes_mut(node)?;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), TreeError> {
        self.attributes_mut(node)?.retain(|(k, _)| k != name);
        Ok(())
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.payload {
            Payload::Text(text) => Some(text),
            Payload::Element { .. } => None,
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError> {
        let data = self
            .nodes
            .get_mut(node.index())
            .ok_or(TreeError::NodeNotFound(node))?;
        match &mut data.payload {
            Payload::Text(current) => {
                if current == text {
                    return Ok(());
                }
                *current = text.to_string();
            }
            Payload::Element { .. } => return Err(TreeError::NotText(node)),
        }
        self.notify(MutationKind::TextChanged, node);
        Ok(())
    }

    fn replace_with(
        &mut self,
        node: NodeId,
        fragments: Vec<Fragment>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let (parent, pos) = self.slot(node)?;

        let mut inserted = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let id = match fragment {
                Fragment::Text(text) => self.alloc(Payload::Text(text), Some(parent)),
                Fragment::Element {
                    tag,
                    attributes,
                    text,
                } => {
                    let id = self.alloc(
                        Payload::Element {
                            tag: tag.to_ascii_lowercase(),
                            attributes,
                        },
                        Some(parent),
                    );
                    let child = self.alloc(Payload::Text(text), Some(id));
                    self.nodes[id.index()].children.push(child);
                    id
                }
            };
            inserted.push(id);
        }

        let siblings = &mut self.nodes[parent.index()].children;
        siblings.remove(pos);
        for (offset, &id) in inserted.iter().enumerate() {
            siblings.insert(pos + offset, id);
        }
        self.nodes[node.index()].parent = None;

        self.notify(MutationKind::ChildRemoved, node);
        for &id in &inserted {
            self.notify(MutationKind::ChildAdded, id);
        }
        Ok(inserted)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        let (parent, pos) = self.slot(node)?;
        self.nodes[parent.index()].children.remove(pos);
        self.nodes[node.index()].parent = None;
        self.notify(MutationKind::ChildRemoved, node);
        Ok(())
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn location(&self) -> Location {
        self.location.clone()
    }

    fn observe(&mut self) -> mpsc::UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        rx
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
