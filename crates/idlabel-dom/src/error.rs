//! Error types for the document tree layer

use crate::tree::NodeId;

/// Errors from tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Node id does not exist in this document
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Node is no longer attached to the document
    #[error("node {0} is detached")]
    Detached(NodeId),

    /// Operation requires a text node
    #[error("node {0} is not a text node")]
    NotText(NodeId),

    /// Operation requires an element node
    #[error("node {0} is not an element")]
    NotElement(NodeId),

    /// Operation is not allowed on the document root
    #[error("operation not allowed on the root node")]
    RootNode,
}

/// Errors parsing a structural selector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Selector text is empty
    #[error("empty selector")]
    Empty,

    /// Unexpected character at a position
    #[error("unexpected '{found}' at {position} in selector '{selector}'")]
    Unexpected {
        /// Full selector text
        selector: String,
        /// Offending character
        found: char,
        /// Character offset
        position: usize,
    },

    /// Attribute selector was not closed
    #[error("unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),
}
