//! Text rewriting
//!
//! Pure string functions: no tree access. [`rewrite_segments`] is the single
//! decision point; [`rewrite_text`] and the annotator both build on it.

use idlabel_core::identifier::find_all;
use idlabel_core::LabelMap;
use std::borrow::Cow;

/// Piece of a rewritten text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text, including the separator written before a label
    Text(String),
    /// Parenthesized label, `(label)`
    Label(String),
}

impl Segment {
    /// Text of the segment
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Label(s) => s,
        }
    }
}

/// Whether `text` already carries the parenthesized form of any label
///
/// Coarse guard against double wrapping. Labels whose parenthesized forms
/// overlap can make it fire on text that was never rewritten.
#[must_use]
pub fn has_any_label(text: &str, mapping: &LabelMap) -> bool {
    mapping
        .labels()
        .any(|label| text.contains(&label.parenthesized()))
}

/// Split `text` into plain and label segments
///
/// Returns `None` when nothing would change: no registered identifier
/// occurrence, or the label guard fires.
#[must_use]
pub fn rewrite_segments(text: &str, mapping: &LabelMap) -> Option<Vec<Segment>> {
    if mapping.is_empty() || has_any_label(text, mapping) {
        return None;
    }

    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in find_all(text) {
        let Some(label) = mapping.get(&found.identifier()) else {
            continue;
        };
        segments.push(Segment::Text(format!("{} ", &text[cursor..found.end()])));
        segments.push(Segment::Label(label.parenthesized()));
        cursor = found.end();
    }

    if segments.is_empty() {
        return None;
    }
    if cursor < text.len() {
        segments.push(Segment::Text(text[cursor..].to_string()));
    }
    Some(segments)
}

/// Append ` (label)` after every registered identifier in `text`
///
/// The identifier keeps its original form (grouped or contiguous).
/// Unregistered identifiers are left alone. ARNs are not detected here;
/// [`Annotator::rewrite_text`](crate::Annotator::rewrite_text) skips them.
#[must_use]
pub fn rewrite_text<'t>(text: &'t str, mapping: &LabelMap) -> Cow<'t, str> {
    match rewrite_segments(text, mapping) {
        Some(segments) => Cow::Owned(segments.iter().map(Segment::as_str).collect()),
        None => Cow::Borrowed(text),
    }
}

/// Remove the ` (label)` groups [`rewrite_text`] appended
#[must_use]
pub fn strip_labels<'t>(text: &'t str, mapping: &LabelMap) -> Cow<'t, str> {
    let mut out = String::new();
    let mut cursor = 0;
    for found in find_all(text) {
        // Digits inside a removed label.
        if found.start() < cursor {
            continue;
        }
        let Some(label) = mapping.get(&found.identifier()) else {
            continue;
        };
        let suffix = format!(" {}", label.parenthesized());
        if text[found.end()..].starts_with(&suffix) {
            out.push_str(&text[cursor..found.end()]);
            cursor = found.end() + suffix.len();
        }
    }

    if cursor == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}
