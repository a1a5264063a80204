//! Error types for the engine
//!
//! Nothing here ever reaches the host document: the controller logs these
//! and degrades instead of failing.

use crate::state_machine::ControllerState;
use idlabel_core::StoreError;
use idlabel_dom::SelectorError;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(String),

    /// Field out of range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },

    /// A scope selector did not parse
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
}

impl ConfigError {
    /// Create an IO error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Illegal controller state transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not in the allowed table
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: ControllerState,
        /// Requested state
        to: ControllerState,
    },
}

/// Controller errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Mapping fetch or subscription failed during initialization
    #[error("initialization failed: {0}")]
    Initialization(#[source] StoreError),

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// State machine rejected a transition
    #[error("state machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    /// `start` called twice
    #[error("controller already started")]
    AlreadyStarted,

    /// Tracing subscriber could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl EngineError {
    /// Whether the controller keeps running after this error
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Initialization(_) | Self::Store(_) | Self::StateMachine(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
