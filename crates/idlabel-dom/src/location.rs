//! Document location (host + path)

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Where a document is currently rendered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    /// Host name, lower-cased, without port
    pub host: String,
    /// Path component, always starting with `/`
    pub path: String,
}

impl Location {
    /// Create a location, normalizing host case and a missing leading `/`
    #[must_use]
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            host: host.into().to_ascii_lowercase(),
            path,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.path)
    }
}
