//! Identifier → label mapping
//!
//! [`LabelMap`] is the read-only snapshot the engine works against. Every
//! key is a canonical [`Identifier`] and every value a non-empty [`Label`],
//! so consumers never re-validate on read.

use crate::error::ValidationError;
use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Non-empty user-supplied label
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Create a label
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidLabel`] for an empty string
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::InvalidLabel {
                key: String::new(),
                reason: "label must not be empty",
            });
        }
        Ok(Self(value))
    }

    /// Label text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parenthesized form as written next to an identifier: `(label)`
    #[inline]
    #[must_use]
    pub fn parenthesized(&self) -> String {
        format!("({})", self.0)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Label {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Label> for String {
    fn from(value: Label) -> Self {
        value.0
    }
}

/// Set of (identifier, label) pairs, unique by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(BTreeMap<Identifier, Label>);

impl LabelMap {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Label registered for `id`
    #[inline]
    #[must_use]
    pub fn get(&self, id: &Identifier) -> Option<&Label> {
        self.0.get(id)
    }

    /// Insert or replace a label, returning the previous one
    #[inline]
    pub fn insert(&mut self, id: Identifier, label: Label) -> Option<Label> {
        self.0.insert(id, label)
    }

    /// Remove a label
    #[inline]
    pub fn remove(&mut self, id: &Identifier) -> Option<Label> {
        self.0.remove(id)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in identifier order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Label)> {
        self.0.iter()
    }

    /// Iterate label values
    #[inline]
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.0.values()
    }

    /// Validate an untyped JSON object into a mapping
    ///
    /// Every key must be a canonical identifier and every value a non-empty
    /// string. The first offending entry is reported.
    ///
    /// # Errors
    /// Returns [`ValidationError`] describing the first invalid entry
    pub fn from_json_value(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(json_kind(value)))?;

        let mut map = BTreeMap::new();
        for (key, raw) in object {
            let id = Identifier::parse(key)
                .map_err(|_| ValidationError::InvalidKey { key: key.clone() })?;
            let text = raw.as_str().ok_or_else(|| ValidationError::InvalidLabel {
                key: key.clone(),
                reason: "label must be a string",
            })?;
            if text.is_empty() {
                return Err(ValidationError::InvalidLabel {
                    key: key.clone(),
                    reason: "label must not be empty",
                });
            }
            map.insert(id, Label(text.to_string()));
        }
        Ok(Self(map))
    }
}

impl FromIterator<(Identifier, Label)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (Identifier, Label)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LabelMap {
    type Item = (&'a Identifier, &'a Label);
    type IntoIter = std::collections::btree_map::Iter<'a, Identifier, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
