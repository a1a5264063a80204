//! Export/import wire format
//!
//! ```text
//! { "version": 1, "exportedAt": "2026-01-01T00:00:00Z", "aliases": { "123456789012": "Prod" } }
//! ```
//!
//! Import also accepts a bare `{ "123456789012": "Prod" }` object.

use crate::error::ValidationError;
use crate::mapping::LabelMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current export format version
pub const EXPORT_VERSION: u32 = 1;

/// Serialized export envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Format version
    pub version: u32,
    /// When the export was produced
    pub exported_at: DateTime<Utc>,
    /// Exported mapping
    pub aliases: LabelMap,
}

impl ExportDocument {
    /// Wrap a mapping in an envelope stamped now
    #[must_use]
    pub fn new(aliases: LabelMap) -> Self {
        Self {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            aliases,
        }
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns the serializer error (not expected for valid mappings)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse and validate an import payload
///
/// An object with an `aliases` member is treated as an export envelope;
/// any other object is treated as a bare mapping.
///
/// # Errors
/// Returns [`ValidationError`] for malformed JSON or any invalid entry
pub fn parse_import(text: &str) -> Result<LabelMap, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ValidationError::Json(e.to_string()))?;
    match value.get("aliases") {
        Some(aliases) => LabelMap::from_json_value(aliases),
        None => LabelMap::from_json_value(&value),
    }
}
