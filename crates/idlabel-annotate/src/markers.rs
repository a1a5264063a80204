//! Markup written into the document
//!
//! - processed mark: `data-idlabel-processed="nav|page"` on visited elements
//! - labeled span: `<span class="idlabel-label" data-idlabel-scope="nav|page">(label)</span>`
//! - page kind tag: `data-idlabel-page="home|selector"` on the root
//! - title record: the title before and after a rewrite, on the root

use idlabel_dom::{DocumentTree, Fragment, NodeId, PageKind, Scope, TreeError};

/// Attribute holding the processed mark
pub const MARK_ATTR: &str = "data-idlabel-processed";

/// Class of every labeled span
pub const SPAN_CLASS: &str = "idlabel-label";

/// Tag of labeled spans
pub const SPAN_TAG: &str = "span";

/// Attribute naming the scope that wrote a span
pub const SCOPE_ATTR: &str = "data-idlabel-scope";

/// Root attribute holding the page kind
pub const PAGE_ATTR: &str = "data-idlabel-page";

/// Root attribute holding the title as it was before a rewrite
pub const TITLE_ORIGINAL_ATTR: &str = "data-idlabel-title";

/// Root attribute holding the title the annotator wrote
pub const TITLE_WRITTEN_ATTR: &str = "data-idlabel-title-written";

/// Whether `node` carries a processed mark
pub fn is_marked<D: DocumentTree + ?Sized>(tree: &D, node: NodeId) -> bool {
    tree.attribute(node, MARK_ATTR).is_some()
}

/// Scope recorded in `node`'s processed mark
pub fn mark_scope<D: DocumentTree + ?Sized>(tree: &D, node: NodeId) -> Option<Scope> {
    tree.attribute(node, MARK_ATTR).and_then(Scope::from_marker)
}

/// Set the processed mark
///
/// # Errors
/// Fails if `node` is not an element
pub fn mark<D: DocumentTree + ?Sized>(
    tree: &mut D,
    node: NodeId,
    scope: Scope,
) -> Result<(), TreeError> {
    tree.set_attribute(node, MARK_ATTR, scope.as_str())
}

/// Whether `node` is a labeled span
pub fn is_label_span<D: DocumentTree + ?Sized>(tree: &D, node: NodeId) -> bool {
    tree.tag_name(node) == Some(SPAN_TAG) && tree.has_class(node, SPAN_CLASS)
}

/// Whether any descendant of `node` is a labeled span
pub fn contains_label_span<D: DocumentTree + ?Sized>(tree: &D, node: NodeId) -> bool {
    tree.descendants(node)
        .into_iter()
        .any(|n| is_label_span(tree, n))
}

/// Fragment for a labeled span holding `text`
#[must_use]
pub fn label_fragment(text: impl Into<String>, scope: Scope) -> Fragment {
    Fragment::Element {
        tag: SPAN_TAG.to_string(),
        attributes: vec![
            ("class".to_string(), SPAN_CLASS.to_string()),
            (SCOPE_ATTR.to_string(), scope.as_str().to_string()),
        ],
        text: text.into(),
    }
}

/// Tag the document root with `kind`, or remove the tag
///
/// # Errors
/// Fails if the root cannot take attributes
pub fn tag_page_kind<D: DocumentTree + ?Sized>(
    tree: &mut D,
    kind: Option<PageKind>,
) -> Result<(), TreeError> {
    let root = tree.root();
    match kind {
        Some(kind) => tree.set_attribute(root, PAGE_ATTR, kind.as_str()),
        None => tree.remove_attribute(root, PAGE_ATTR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlabel_dom::{ArenaDocument, Location};

    #[test]
    fn marks_and_spans() {
        let mut doc = ArenaDocument::new(Location::new("example.com", "/"));
        let root = doc.root();
        let p = doc.append_element(root, "p", &[]).unwrap();
        let text = doc.append_text(p, "x").unwrap();

        assert!(!is_marked(&doc, p));
        mark(&mut doc, p, Scope::PageContent).unwrap();
        assert!(is_marked(&doc, p));
        assert_eq!(mark_scope(&doc, p), Some(Scope::PageContent));

        assert!(!contains_label_span(&doc, p));
        doc.replace_with(text, vec![label_fragment("(L)", Scope::PageContent)])
            .unwrap();
        assert!(contains_label_span(&doc, p));
        assert_eq!(
            doc.outer_html(p),
            "<p data-idlabel-processed=\"page\"><span class=\"idlabel-label\" data-idlabel-scope=\"page\">(L)</span></p>"
        );
    }

    #[test]
    fn page_kind_tag() {
        let mut doc = ArenaDocument::new(Location::new("example.com", "/"));
        tag_page_kind(&mut doc, Some(PageKind::Home)).unwrap();
        assert_eq!(doc.attribute(doc.root(), PAGE_ATTR), Some("home"));
        tag_page_kind(&mut doc, None).unwrap();
        assert_eq!(doc.attribute(doc.root(), PAGE_ATTR), None);
    }
}
