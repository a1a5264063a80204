//! Identifier codec
//!
//! Recognizes identifiers in their two textual forms and converts between
//! them:
//! - canonical: `123456789012`
//! - display: `1234-5678-9012`
//!
//! All matching goes through one shared compiled pattern. Each call to
//! [`find_all`] starts a fresh scan, so iterators never share state.

use crate::error::IdentifierError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of digits in a canonical identifier
pub const IDENTIFIER_DIGITS: usize = 12;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // ASCII digits and ASCII word boundaries only.
    Regex::new(r"(?-u:\b)(?:[0-9]{4}-[0-9]{4}-[0-9]{4}|[0-9]{12})(?-u:\b)")
        .expect("identifier pattern is valid")
});

/// Canonical 12-digit identifier
///
/// Only constructible from an exact 12 ASCII digit string, so every value
/// held by a mapping satisfies the store boundary invariant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Parse a canonical identifier
    ///
    /// # Errors
    /// Returns [`IdentifierError::NotCanonical`] unless `s` is exactly 12 ASCII digits
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        if is_canonical(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentifierError::NotCanonical(s.to_string()))
        }
    }

    /// Canonical string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hyphen-grouped display form
    #[inline]
    #[must_use]
    pub fn display_form(&self) -> String {
        format(&self.0)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_canonical(&value) {
            Ok(Self(value))
        } else {
            Err(IdentifierError::NotCanonical(value))
        }
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One identifier occurrence inside a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierMatch<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> IdentifierMatch<'t> {
    /// Matched text in its original form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'t str {
        self.text
    }

    /// Byte offset of the match start
    #[inline]
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the match end
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Canonical identifier the match denotes
    #[must_use]
    pub fn identifier(&self) -> Identifier {
        // The shared pattern only yields the two recognized shapes.
        Identifier(self.text.replace('-', ""))
    }
}

/// Strip hyphen separators from a recognized identifier
///
/// Returns `None` when `text` is neither 12 contiguous digits nor three
/// hyphen-separated groups of four.
#[must_use]
pub fn normalize(text: &str) -> Option<Identifier> {
    if is_canonical(text) {
        return Some(Identifier(text.to_string()));
    }
    let groups: Vec<&str> = text.split('-').collect();
    let grouped = groups.len() == 3
        && groups
            .iter()
            .all(|g| g.len() == 4 && g.bytes().all(|b| b.is_ascii_digit()));
    grouped.then(|| Identifier(groups.concat()))
}

/// Convert a canonical identifier to `dddd-dddd-dddd`
///
/// Input that is not exactly 12 digits is returned unchanged.
#[must_use]
pub fn format(id: &str) -> String {
    if !is_canonical(id) {
        return id.to_string();
    }
    format!("{}-{}-{}", &id[0..4], &id[4..8], &id[8..12])
}

/// All identifier occurrences in `text`, left to right, non-overlapping
pub fn find_all(text: &str) -> impl Iterator<Item = IdentifierMatch<'_>> + '_ {
    IDENTIFIER_PATTERN.find_iter(text).map(|m| IdentifierMatch {
        text: m.as_str(),
        start: m.start(),
        end: m.end(),
    })
}

/// Whether `text` contains at least one identifier occurrence
#[inline]
#[must_use]
pub fn contains_identifier(text: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(text)
}

fn is_canonical(s: &str) -> bool {
    s.len() == IDENTIFIER_DIGITS && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_both_shapes() {
        assert_eq!(normalize("123456789012").unwrap().as_str(), "123456789012");
        assert_eq!(normalize("1234-5678-9012").unwrap().as_str(), "123456789012");
    }

    #[test]
    fn normalize_rejects_other_shapes() {
        assert!(normalize("1234-56789012").is_none());
        assert!(normalize("12345678901").is_none());
        assert!(normalize("123-4567-89012").is_none());
        assert!(normalize("abcd-efgh-ijkl").is_none());
    }

    #[test]
    fn format_groups_canonical() {
        assert_eq!(format("123456789012"), "1234-5678-9012");
    }

    #[test]
    fn format_passes_through_non_canonical() {
        assert_eq!(format("1234"), "1234");
        assert_eq!(format("1234-5678-9012"), "1234-5678-9012");
        assert_eq!(format("12345678901a"), "12345678901a");
    }

    #[test]
    fn find_all_in_order() {
        let text = "a 111122223333 b 4444-5555-6666 c";
        let found: Vec<_> = find_all(text).map(|m| m.as_str()).collect();
        assert_eq!(found, vec!["111122223333", "4444-5555-6666"]);

        let first = find_all(text).next().unwrap();
        assert_eq!(&text[first.start()..first.end()], "111122223333");
        assert_eq!(first.identifier().as_str(), "111122223333");
    }

    #[test]
    fn find_all_ignores_longer_digit_runs() {
        assert_eq!(find_all("1234567890123").count(), 0);
        assert_eq!(find_all("x12345678901y").count(), 0);
    }

    #[test]
    fn find_all_is_restartable() {
        let text = "111122223333 and 222233334444";
        assert_eq!(find_all(text).count(), 2);
        assert_eq!(find_all(text).count(), 2);
    }

    #[test]
    fn non_ascii_digits_are_not_identifiers() {
        let arabic = "id \u{661}\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\u{669}\u{660}\u{661}\u{662} here";
        assert_eq!(find_all(arabic).count(), 0);
        assert!(!contains_identifier(arabic));

        let mixed = "\u{661}123456789012 ok";
        let found: Vec<_> = find_all(mixed).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier().as_str(), "123456789012");
        assert_eq!(normalize(found[0].as_str()), Some(found[0].identifier()));
    }

    #[test]
    fn identifier_parse_and_serde() {
        assert!(Identifier::parse("12345678901").is_err());
        let id: Identifier = "123456789012".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"123456789012\"");
        assert!(serde_json::from_str::<Identifier>("\"1234-5678-9012\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_format_roundtrip(id in "[0-9]{12}") {
            let normalized = normalize(&format(&id)).unwrap();
            prop_assert_eq!(normalized.as_str(), id.as_str());
        }

        #[test]
        fn prop_format_identity_off_shape(s in "[0-9a-z-]{0,20}") {
            prop_assume!(!(s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit())));
            prop_assert_eq!(format(&s), s);
        }
    }
}
