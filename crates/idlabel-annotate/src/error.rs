//! Error types for the annotator
//!
//! Annotation errors never escape a pass: they are logged and counted per
//! node in [`crate::PassReport`].

use idlabel_dom::{NodeId, TreeError};

/// Per-node annotation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotateError {
    /// Underlying tree operation failed
    #[error("tree operation on {node} failed: {source}")]
    Tree {
        /// Node being processed
        node: NodeId,
        /// Tree error
        #[source]
        source: TreeError,
    },

    /// Annotation targets must be elements
    #[error("node {0} is not an element")]
    NotElement(NodeId),
}

impl AnnotateError {
    /// Wrap a tree error for `node`
    pub fn tree(node: NodeId, source: TreeError) -> Self {
        Self::Tree { node, source }
    }
}

/// Result type for annotator operations
pub type AnnotateResult<T> = Result<T, AnnotateError>;
