//! idlabel Document Model
//!
//! Abstract view of a live, externally mutated document tree plus the
//! structural selectors and scope rules that decide where labels may go.
//!
//! # Overview
//!
//! - **DocumentTree**: node enumeration, text/attribute access, fragment
//!   splicing and a mutation subscription
//! - **ArenaDocument**: in-memory implementation
//! - **SelectorList**: small CSS-like selector language
//! - **ScopeClassifier**: exclusion rules, location classification and the
//!   navigation/page-content scope selector set
//!
//! # Example
//!
//! ```rust
//! use idlabel_dom::prelude::*;
//!
//! let mut doc = ArenaDocument::new(Location::new("console.aws.amazon.com", "/console/home"));
//! let root = doc.root();
//! let code = doc.append_element(root, "code", &[]).unwrap();
//! let text = doc.append_text(code, "123456789012").unwrap();
//!
//! let classifier = ScopeClassifier::from_config(&ScopeConfig::default()).unwrap();
//! assert!(classifier.is_excluded(&doc, text));
//! ```

#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod location;
pub mod scope;
pub mod selector;
pub mod tree;

// Re-exports
pub use arena::ArenaDocument;
pub use error::{SelectorError, TreeError};
pub use location::Location;
pub use scope::{LocationClass, PageKind, Scope, ScopeClassifier, ScopeConfig, ScopeSelectorSet};
pub use selector::{query_all, Selector, SelectorList};
pub use tree::{DocumentTree, Fragment, MutationKind, MutationRecord, NodeId, NodeKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with documents and scopes
    pub use crate::{
        ArenaDocument, DocumentTree, Fragment, Location, NodeId, Scope, ScopeClassifier,
        ScopeConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
