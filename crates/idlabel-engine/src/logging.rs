//! Structured logging
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Initialization failed, engine degraded |
//! | WARN  | Per-node failure, skipped notification |
//! | INFO  | Lifecycle: start, stop, initialization |
//! | DEBUG | Trigger decisions, pass summaries, state transitions |

use crate::error::EngineError;
use crate::scheduler::Trigger;
use chrono::{DateTime, Utc};
use idlabel_annotate::PassReport;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Field names recorded on a pass span once the pass has run
pub mod fields {
    /// Pass sequence number
    pub const PASS: &str = "pass";

    /// Triggers folded into a pass
    pub const TRIGGERS: &str = "triggers";
}

/// Install a global subscriber
///
/// `RUST_LOG` wins over `default_filter` when set. `json` selects JSON
/// lines instead of human-readable text.
///
/// # Errors
/// [`EngineError::Logging`] for a bad filter or when a subscriber is
/// already installed
pub fn init_tracing(default_filter: &str, json: bool) -> Result<(), EngineError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| EngineError::Logging(e.to_string()))?,
    };
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| EngineError::Logging(e.to_string()))
}

/// One completed pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    /// Sequence number, starting at 1
    pub sequence: u64,
    /// When the pass finished
    pub recorded_at: DateTime<Utc>,
    /// What caused it
    pub triggers: Vec<Trigger>,
    /// Counters
    pub report: PassReport,
}

/// Append-only in-memory pass history
#[derive(Debug, Default)]
pub struct PassLog {
    inner: Mutex<Vec<PassRecord>>,
}

impl PassLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass; returns its sequence number
    pub fn append(&self, triggers: Vec<Trigger>, report: PassReport) -> u64 {
        let mut guard = self.inner.lock();
        let sequence = guard.last().map_or(1, |r| r.sequence + 1);
        guard.push(PassRecord {
            sequence,
            recorded_at: Utc::now(),
            triggers,
            report,
        });
        sequence
    }

    /// Snapshot of every record
    #[must_use]
    pub fn records(&self) -> Vec<PassRecord> {
        self.inner.lock().clone()
    }

    /// Most recent record
    #[must_use]
    pub fn last(&self) -> Option<PassRecord> {
        self.inner.lock().last().cloned()
    }

    /// Number of passes recorded
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no pass was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
