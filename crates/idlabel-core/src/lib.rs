//! idlabel Core
//!
//! Identifier codec, label mapping and the store contract consumed by the
//! annotation engine.
//!
//! # Overview
//!
//! - **Identifier**: canonical 12-digit identifier with a 4-4-4 display form
//! - **LabelMap**: validated identifier → label mapping
//! - **LabelStore**: async store contract with change notification
//!
//! # Example
//!
//! ```rust
//! use idlabel_core::identifier::{find_all, format, normalize};
//!
//! assert_eq!(format("123456789012"), "1234-5678-9012");
//! assert_eq!(normalize("1234-5678-9012").unwrap().as_str(), "123456789012");
//!
//! let found: Vec<_> = find_all("Account: 1234-5678-9012").map(|m| m.as_str()).collect();
//! assert_eq!(found, vec!["1234-5678-9012"]);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod export;
pub mod identifier;
pub mod mapping;
pub mod store;

// Re-exports
pub use error::{IdentifierError, StoreError, StoreResult, ValidationError};
pub use export::{parse_import, ExportDocument, EXPORT_VERSION};
pub use identifier::{Identifier, IdentifierMatch};
pub use mapping::{Label, LabelMap};
pub use store::{LabelStore, MemoryLabelStore};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with identifiers and labels
    pub use crate::identifier::{contains_identifier, find_all, format, normalize};
    pub use crate::{Identifier, Label, LabelMap, LabelStore, MemoryLabelStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
