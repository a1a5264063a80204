//! idlabel Annotator
//!
//! Rewrites identifier occurrences in a [`DocumentTree`](idlabel_dom::DocumentTree)
//! so that each registered identifier is followed by a labeled span holding
//! `(label)`. Visited elements are marked; a marked element is never
//! rewritten again until it is cleared.
//!
//! # Example
//!
//! ```rust
//! use idlabel_annotate::{rewrite_text, Annotator};
//! use idlabel_core::{Identifier, Label, LabelMap};
//! use idlabel_dom::prelude::*;
//!
//! let mapping: LabelMap = [(
//!     Identifier::parse("123456789012").unwrap(),
//!     Label::new("Prod").unwrap(),
//! )]
//! .into_iter()
//! .collect();
//! assert_eq!(rewrite_text("Account: 1234-5678-9012", &mapping), "Account: 1234-5678-9012 (Prod)");
//!
//! let mut doc = ArenaDocument::new(Location::new("console.aws.amazon.com", "/console/home"));
//! let root = doc.root();
//! let p = doc.append_element(root, "p", &[]).unwrap();
//! doc.append_text(p, "Account: 1234-5678-9012").unwrap();
//!
//! let annotator = Annotator::new(ScopeClassifier::from_config(&ScopeConfig::default()).unwrap());
//! annotator.annotate_subtree(&mut doc, root, &mapping, Scope::PageContent);
//! assert_eq!(doc.text_content(p), "Account: 1234-5678-9012 (Prod)");
//! ```

#![warn(missing_docs)]

pub mod annotator;
pub mod error;
pub mod markers;
pub mod report;
pub mod rewrite;

// Re-exports
pub use annotator::Annotator;
pub use error::{AnnotateError, AnnotateResult};
pub use report::{AnnotateOutcome, PassReport};
pub use rewrite::{rewrite_segments, rewrite_text, strip_labels, Segment};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
