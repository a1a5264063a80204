//! idlabel Engine
//!
//! Reactive controller that keeps a live document annotated as the label
//! mapping, the document and the location change.
//!
//! # Overview
//!
//! - **Controller**: lifecycle, triggers and passes
//! - **PendingSlot**: single-slot debounce scheduler
//! - **NavigationObserver**: native events or location polling
//! - **EngineConfig**: TOML configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use idlabel_core::MemoryLabelStore;
//! use idlabel_dom::{ArenaDocument, Location};
//! use idlabel_engine::{Controller, EngineConfig};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), idlabel_engine::EngineError> {
//! let document = Arc::new(Mutex::new(ArenaDocument::new(Location::new(
//!     "console.aws.amazon.com",
//!     "/console/home",
//! ))));
//! let store = Arc::new(MemoryLabelStore::new());
//!
//! let mut controller = Controller::new(document, store, EngineConfig::default())?;
//! controller.start().await?;
//! // ... the host mutates the document ...
//! controller.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod scheduler;
pub mod state_machine;

// Re-exports
pub use config::EngineConfig;
pub use controller::{is_relevant_mutation, Controller, SharedDocument};
pub use error::{ConfigError, EngineError, EngineResult, StateMachineError};
pub use logging::{init_tracing, PassLog, PassRecord};
pub use navigation::{HistoryEvents, LocationPoller, NavigationHandle, NavigationObserver};
pub use scheduler::{PassPlan, PendingSlot, Trigger};
pub use state_machine::ControllerState;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting a controller
    pub use crate::{Controller, ControllerState, EngineConfig, HistoryEvents, NavigationHandle};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
