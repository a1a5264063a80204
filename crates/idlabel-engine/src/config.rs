//! Engine configuration
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below.
//!
//! ```toml
//! debounce_ms = 100
//! safety_interval_ms = 3000
//! navigation_poll_ms = 250
//!
//! [scope]
//! exclusion_selectors = ["code", "pre", ".arn"]
//! ```

use crate::error::ConfigError;
use idlabel_dom::{ScopeClassifier, ScopeConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Default safety re-scan period
pub const DEFAULT_SAFETY_INTERVAL_MS: u64 = 3000;

/// Default location polling period of the fallback navigation observer
pub const DEFAULT_NAVIGATION_POLL_MS: u64 = 250;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Triggers closer together than this coalesce into one pass
    pub debounce_ms: u64,
    /// Period of the safety re-scan
    pub safety_interval_ms: u64,
    /// Location polling period when no native navigation events exist
    pub navigation_poll_ms: u64,
    /// Scope selectors, exclusions and location rules
    pub scope: ScopeConfig,
}

impl EngineConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce window
    #[must_use]
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the safety re-scan period
    #[must_use]
    pub fn with_safety_interval_ms(mut self, ms: u64) -> Self {
        self.safety_interval_ms = ms;
        self
    }

    /// Set the location polling period
    #[must_use]
    pub fn with_navigation_poll_ms(mut self, ms: u64) -> Self {
        self.navigation_poll_ms = ms;
        self
    }

    /// Replace the scope configuration
    #[must_use]
    pub fn with_scope(mut self, scope: ScopeConfig) -> Self {
        self.scope = scope;
        self
    }

    /// Debounce window
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Safety re-scan period
    #[must_use]
    pub fn safety_interval(&self) -> Duration {
        Duration::from_millis(self.safety_interval_ms)
    }

    /// Location polling period
    #[must_use]
    pub fn navigation_poll(&self) -> Duration {
        Duration::from_millis(self.navigation_poll_ms)
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// [`ConfigError::Parse`] or any [`EngineConfig::validate`] error
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Check intervals and selectors
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] for zero intervals,
    /// [`ConfigError::Selector`] for selectors that do not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("debounce_ms", self.debounce_ms),
            ("safety_interval_ms", self.safety_interval_ms),
            ("navigation_poll_ms", self.navigation_poll_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        self.classifier()?;
        Ok(())
    }

    /// Build the scope classifier
    ///
    /// # Errors
    /// [`ConfigError::Selector`] for selectors that do not parse
    pub fn classifier(&self) -> Result<ScopeClassifier, ConfigError> {
        Ok(ScopeClassifier::from_config(&self.scope)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            safety_interval_ms: DEFAULT_SAFETY_INTERVAL_MS,
            navigation_poll_ms: DEFAULT_NAVIGATION_POLL_MS,
            scope: ScopeConfig::default(),
        }
    }
}
