//! In-place annotation of document subtrees
//!
//! The annotator rewrites eligible text nodes into plain text followed by a
//! labeled span, marks visited elements so later passes skip them, and can
//! reverse its own rewrites.
//!
//! Failures are isolated per candidate: [`Annotator::annotate_subtree`]
//! logs and counts them and keeps going.

use crate::error::{AnnotateError, AnnotateResult};
use crate::markers::{
    self, is_label_span, is_marked, MARK_ATTR, SCOPE_ATTR, TITLE_ORIGINAL_ATTR, TITLE_WRITTEN_ATTR,
};
use crate::report::{AnnotateOutcome, PassReport};
use crate::rewrite::{self, rewrite_segments, Segment};
use idlabel_core::identifier::contains_identifier;
use idlabel_core::LabelMap;
use idlabel_dom::{DocumentTree, Fragment, NodeId, Scope, ScopeClassifier};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Scope-aware annotator
#[derive(Debug, Clone)]
pub struct Annotator {
    classifier: ScopeClassifier,
}

impl Annotator {
    /// Annotator using `classifier` for exclusion decisions
    #[must_use]
    pub fn new(classifier: ScopeClassifier) -> Self {
        Self { classifier }
    }

    /// Classifier in use
    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &ScopeClassifier {
        &self.classifier
    }

    /// Annotate one element
    ///
    /// Skipped when the element is excluded or already marked. When it
    /// already holds a labeled span only the mark is set. Otherwise every
    /// non-blank text descendant with a non-excluded parent and an identifier
    /// occurrence is rewritten, then the element is marked.
    ///
    /// # Errors
    /// Returns [`AnnotateError`] when `node` is not an element or a tree
    /// operation fails; the element is then left unmarked.
    pub fn annotate<D: DocumentTree + ?Sized>(
        &self,
        tree: &mut D,
        node: NodeId,
        mapping: &LabelMap,
        scope: Scope,
    ) -> AnnotateResult<AnnotateOutcome> {
        if !tree.is_element(node) {
            return Err(AnnotateError::NotElement(node));
        }
        if self.classifier.is_excluded(tree, node) {
            return Ok(AnnotateOutcome::Excluded);
        }
        if is_marked(tree, node) {
            return Ok(AnnotateOutcome::AlreadyMarked);
        }
        if markers::contains_label_span(tree, node) {
            markers::mark(tree, node, scope).map_err(|e| AnnotateError::tree(node, e))?;
            return Ok(AnnotateOutcome::MarkedOnly);
        }

        let targets: Vec<NodeId> = tree
            .descendants(node)
            .into_iter()
            .filter(|&n| self.is_rewritable_text(tree, n))
            .collect();

        let mut text_nodes = 0;
        for target in targets {
            let Some(text) = tree.text(target) else {
                continue;
            };
            let Some(segments) = rewrite_segments(text, mapping) else {
                continue;
            };
            let fragments = segments
                .into_iter()
                .map(|segment| match segment {
                    Segment::Text(text) => Fragment::Text(text),
                    Segment::Label(label) => markers::label_fragment(label, scope),
                })
                .collect();
            tree.replace_with(target, fragments)
                .map_err(|e| AnnotateError::tree(target, e))?;
            text_nodes += 1;
        }

        markers::mark(tree, node, scope).map_err(|e| AnnotateError::tree(node, e))?;
        if text_nodes > 0 {
            debug!(%node, %scope, text_nodes, "annotated");
        }
        Ok(AnnotateOutcome::Rewritten { text_nodes })
    }

    /// Annotate every candidate under `root` and the document title
    ///
    /// Candidates are unmarked elements (root included) with a direct text
    /// child holding an identifier, visited in document order.
    pub fn annotate_subtree<D: DocumentTree + ?Sized>(
        &self,
        tree: &mut D,
        root: NodeId,
        mapping: &LabelMap,
        scope: Scope,
    ) -> PassReport {
        let mut report = PassReport::default();
        if mapping.is_empty() {
            return report;
        }

        let candidates: Vec<NodeId> = std::iter::once(root)
            .chain(tree.descendants(root))
            .filter(|&n| self.is_candidate(tree, n))
            .collect();

        for candidate in candidates {
            if !tree.is_connected(candidate) {
                continue;
            }
            match self.annotate(tree, candidate, mapping, scope) {
                Ok(outcome) => report.record(outcome),
                Err(error) => {
                    warn!(node = %candidate, %scope, %error, "annotation failed");
                    report.record_failure();
                }
            }
        }

        report.title_updated = self.update_title(tree, mapping);
        report
    }

    /// Rewrite a free-standing text
    ///
    /// Texts holding an ARN are returned unchanged.
    #[must_use]
    pub fn rewrite_text<'t>(&self, text: &'t str, mapping: &LabelMap) -> Cow<'t, str> {
        if self.classifier.contains_arn(text) {
            return Cow::Borrowed(text);
        }
        rewrite::rewrite_text(text, mapping)
    }

    /// Rewrite the document title; returns whether it changed
    ///
    /// The previous and the written title are recorded on the root so
    /// [`restore_title`](Self::restore_title) can undo exactly this rewrite.
    pub fn update_title<D: DocumentTree + ?Sized>(&self, tree: &mut D, mapping: &LabelMap) -> bool {
        let original = tree.title().to_string();
        if !contains_identifier(&original) {
            return false;
        }
        let written = match self.rewrite_text(&original, mapping) {
            Cow::Borrowed(_) => return false,
            Cow::Owned(written) if written == original => return false,
            Cow::Owned(written) => written,
        };

        let root = tree.root();
        let recorded = tree
            .set_attribute(root, TITLE_ORIGINAL_ATTR, &original)
            .and_then(|()| tree.set_attribute(root, TITLE_WRITTEN_ATTR, &written));
        if let Err(error) = recorded {
            warn!(%error, "cannot record title; leaving it untouched");
            return false;
        }
        tree.set_title(&written);
        true
    }

    /// Undo the last [`update_title`](Self::update_title)
    ///
    /// Nothing happens when the host replaced the title since; the record is
    /// dropped either way.
    pub fn restore_title<D: DocumentTree + ?Sized>(&self, tree: &mut D) -> bool {
        let root = tree.root();
        let original = tree.attribute(root, TITLE_ORIGINAL_ATTR).map(str::to_string);
        let written = tree.attribute(root, TITLE_WRITTEN_ATTR).map(str::to_string);
        let (Some(original), Some(written)) = (original, written) else {
            return false;
        };
        for name in [TITLE_ORIGINAL_ATTR, TITLE_WRITTEN_ATTR] {
            if let Err(error) = tree.remove_attribute(root, name) {
                warn!(%error, attribute = name, "failed to drop title record");
            }
        }
        if tree.title() != written {
            debug!("title replaced by host; not restoring");
            return false;
        }
        tree.set_title(&original);
        true
    }

    /// Remove every labeled span and mark under `root`
    pub fn clear<D: DocumentTree + ?Sized>(&self, tree: &mut D, root: NodeId) -> PassReport {
        self.clear_matching(tree, root, None)
    }

    /// Remove the labeled spans and marks written by `scope` under `root`
    pub fn clear_scope<D: DocumentTree + ?Sized>(
        &self,
        tree: &mut D,
        root: NodeId,
        scope: Scope,
    ) -> PassReport {
        self.clear_matching(tree, root, Some(scope))
    }

    fn clear_matching<D: DocumentTree + ?Sized>(
        &self,
        tree: &mut D,
        root: NodeId,
        scope: Option<Scope>,
    ) -> PassReport {
        let in_scope = |tree: &D, node: NodeId, attr: &str| match scope {
            Some(scope) => tree.attribute(node, attr) == Some(scope.as_str()),
            None => true,
        };

        let mut report = PassReport::default();
        let nodes: Vec<NodeId> = std::iter::once(root).chain(tree.descendants(root)).collect();

        for &span in &nodes {
            if !is_label_span(tree, span) || !in_scope(tree, span, SCOPE_ATTR) {
                continue;
            }
            match remove_span(tree, span) {
                Ok(()) => report.cleared += 1,
                Err(error) => {
                    warn!(node = %span, %error, "failed to remove label");
                    report.failed += 1;
                }
            }
        }

        for &node in &nodes {
            if !is_marked(tree, node) || !in_scope(tree, node, MARK_ATTR) {
                continue;
            }
            if let Err(error) = tree.remove_attribute(node, MARK_ATTR) {
                warn!(%node, %error, "failed to unmark");
                report.failed += 1;
            }
        }

        debug!(
            scope = scope.map_or("all", Scope::as_str),
            cleared = report.cleared,
            "cleared labels"
        );
        report
    }

    fn is_candidate<D: DocumentTree + ?Sized>(&self, tree: &D, node: NodeId) -> bool {
        tree.is_element(node)
            && !is_marked(tree, node)
            && !is_label_span(tree, node)
            && tree
                .children(node)
                .into_iter()
                .any(|child| tree.text(child).is_some_and(contains_identifier))
    }

    fn is_rewritable_text<D: DocumentTree + ?Sized>(&self, tree: &D, node: NodeId) -> bool {
        let Some(text) = tree.text(node) else {
            return false;
        };
        if text.trim().is_empty() || !contains_identifier(text) {
            return false;
        }
        tree.parent(node).is_some_and(|parent| {
            !is_label_span(tree, parent) && !self.classifier.is_excluded(tree, parent)
        })
    }
}

/// Detach a labeled span and re-join the text around it
fn remove_span<D: DocumentTree + ?Sized>(tree: &mut D, span: NodeId) -> AnnotateResult<()> {
    let previous = tree.previous_sibling(span).filter(|&n| tree.is_text(n));
    let next = tree.next_sibling(span).filter(|&n| tree.is_text(n));
    tree.remove(span).map_err(|e| AnnotateError::tree(span, e))?;

    let Some(previous) = previous else {
        return Ok(());
    };
    let mut joined = tree.text(previous).unwrap_or_default().to_string();
    if joined.ends_with(' ') {
        joined.pop();
    }
    if let Some(next) = next {
        joined.push_str(tree.text(next).unwrap_or_default());
        tree.remove(next).map_err(|e| AnnotateError::tree(next, e))?;
    }
    tree.set_text(previous, &joined)
        .map_err(|e| AnnotateError::tree(previous, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::SPAN_CLASS;
    use idlabel_core::{Identifier, Label};
    use idlabel_dom::{ArenaDocument, Location, ScopeConfig};
    use pretty_assertions::assert_eq;

    fn annotator() -> Annotator {
        Annotator::new(ScopeClassifier::from_config(&ScopeConfig::default()).unwrap())
    }

    fn prod() -> LabelMap {
        [(
            Identifier::parse("123456789012").unwrap(),
            Label::new("Prod").unwrap(),
        )]
        .into_iter()
        .collect()
    }

    fn doc() -> ArenaDocument {
        ArenaDocument::new(Location::new("console.aws.amazon.com", "/console/home"))
    }

    #[test]
    fn annotate_inserts_span_and_marks() {
        let mut doc = doc();
        let root = doc.root();
        let p = doc.append_element(root, "p", &[]).unwrap();
        doc.append_text(p, "Account: 1234-5678-9012").unwrap();

        let outcome = annotator()
            .annotate(&mut doc, p, &prod(), Scope::PageContent)
            .unwrap();

        assert_eq!(outcome, AnnotateOutcome::Rewritten { text_nodes: 1 });
        assert_eq!(doc.text_content(p), "Account: 1234-5678-9012 (Prod)");
        assert_eq!(
            doc.outer_html(p),
            format!(
                "<p data-idlabel-processed=\"page\">Account: 1234-5678-9012 \
                 <span class=\"{SPAN_CLASS}\" data-idlabel-scope=\"page\">(Prod)</span></p>"
            )
        );
    }

    #[test]
    fn annotate_is_skipped_when_marked_or_spanned() {
        let annotator = annotator();
        let mut doc = doc();
        let root = doc.root();
        let p = doc.append_element(root, "p", &[]).unwrap();
        doc.append_text(p, "123456789012").unwrap();

        annotator.annotate(&mut doc, p, &prod(), Scope::Navigation).unwrap();
        let before = doc.outer_html(root);
        assert_eq!(
            annotator.annotate(&mut doc, p, &prod(), Scope::Navigation).unwrap(),
            AnnotateOutcome::AlreadyMarked
        );
        assert_eq!(
            annotator.annotate(&mut doc, root, &prod(), Scope::Navigation).unwrap(),
            AnnotateOutcome::MarkedOnly
        );
        doc.remove_attribute(root, MARK_ATTR).unwrap();
        assert_eq!(doc.outer_html(root), before);
    }

    #[test]
    fn annotate_rejects_text_nodes() {
        let mut doc = doc();
        let root = doc.root();
        let text = doc.append_text(root, "123456789012").unwrap();
        assert_eq!(
            annotator().annotate(&mut doc, text, &prod(), Scope::Navigation),
            Err(AnnotateError::NotElement(text))
        );
    }

    #[test]
    fn subtree_visits_nested_candidates() {
        let mut doc = doc();
        let root = doc.root();
        let main = doc.append_element(root, "main", &[]).unwrap();
        let ul = doc.append_element(main, "ul", &[]).unwrap();
        for text in ["a 123456789012", "b 1234-5678-9012", "c 999999999999"] {
            let li = doc.append_element(ul, "li", &[]).unwrap();
            doc.append_text(li, text).unwrap();
        }

        let report = annotator().annotate_subtree(&mut doc, main, &prod(), Scope::PageContent);

        assert_eq!(report.candidates, 3);
        assert_eq!(report.rewritten, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(
            doc.text_content(main),
            "a 123456789012 (Prod)b 1234-5678-9012 (Prod)c 999999999999"
        );

        let again = annotator().annotate_subtree(&mut doc, main, &prod(), Scope::PageContent);
        assert_eq!(again.candidates, 0);
    }

    #[test]
    fn container_text_and_child_text_both_labeled_once() {
        let mut doc = doc();
        let root = doc.root();
        let div = doc.append_element(root, "div", &[]).unwrap();
        doc.append_text(div, "Account 123456789012 ").unwrap();
        let b = doc.append_element(div, "b", &[]).unwrap();
        doc.append_text(b, "1234-5678-9012").unwrap();

        let report = annotator().annotate_subtree(&mut doc, root, &prod(), Scope::PageContent);

        assert_eq!(report.rewritten, 2);
        assert_eq!(
            doc.text_content(div),
            "Account 123456789012 (Prod) 1234-5678-9012 (Prod)"
        );
        assert!(is_marked(&doc, b));
    }

    #[test]
    fn empty_mapping_is_a_no_op() {
        let mut doc = doc();
        let root = doc.root();
        let p = doc.append_element(root, "p", &[]).unwrap();
        doc.append_text(p, "123456789012").unwrap();

        let report = annotator().annotate_subtree(&mut doc, root, &LabelMap::new(), Scope::Navigation);
        assert_eq!(report, PassReport::default());
        assert!(!is_marked(&doc, p));
    }

    #[test]
    fn title_is_rewritten_and_restored() {
        let annotator = annotator();
        let mut doc = doc().with_title("Billing for 123456789012");
        let root = doc.root();

        let report = annotator.annotate_subtree(&mut doc, root, &prod(), Scope::Navigation);
        assert!(report.title_updated);
        assert_eq!(doc.title(), "Billing for 123456789012 (Prod)");
        assert!(!annotator.update_title(&mut doc, &prod()));

        assert!(annotator.restore_title(&mut doc));
        assert_eq!(doc.title(), "Billing for 123456789012");
        assert_eq!(doc.attribute(root, TITLE_ORIGINAL_ATTR), None);
        assert!(!annotator.restore_title(&mut doc));
    }

    #[test]
    fn restore_keeps_labels_the_page_wrote_itself() {
        let annotator = annotator();
        let mut doc = doc().with_title("Billing 123456789012 (Prod) report");

        assert!(!annotator.update_title(&mut doc, &prod()));
        assert!(!annotator.restore_title(&mut doc));
        assert_eq!(doc.title(), "Billing 123456789012 (Prod) report");
    }

    #[test]
    fn restore_leaves_a_title_the_host_replaced() {
        let annotator = annotator();
        let mut doc = doc().with_title("Billing for 123456789012");

        assert!(annotator.update_title(&mut doc, &prod()));
        doc.set_title("Invoices");
        assert!(!annotator.restore_title(&mut doc));
        assert_eq!(doc.title(), "Invoices");
    }

    #[test]
    fn arn_text_is_never_rewritten() {
        let text = "arn:aws:iam::123456789012:role/x";
        assert_eq!(annotator().rewrite_text(text, &prod()), text);
        assert_eq!(
            annotator().rewrite_text("Account 123456789012", &prod()),
            "Account 123456789012 (Prod)"
        );
    }

    #[test]
    fn clear_restores_text() {
        let annotator = annotator();
        let mut doc = doc();
        let root = doc.root();
        let p = doc.append_element(root, "p", &[]).unwrap();
        doc.append_text(p, "x 123456789012 y 1234-5678-9012").unwrap();
        let before = doc.outer_html(root);

        annotator.annotate_subtree(&mut doc, root, &prod(), Scope::Navigation);
        assert_ne!(doc.outer_html(root), before);

        let report = annotator.clear(&mut doc, root);
        assert_eq!(report.cleared, 2);
        assert_eq!(doc.outer_html(root), before);
        assert_eq!(doc.children(p).len(), 1);
    }

    #[test]
    fn clear_scope_leaves_other_scope() {
        let annotator = annotator();
        let mut doc = doc();
        let root = doc.root();
        let nav = doc.append_element(root, "nav", &[]).unwrap();
        doc.append_text(nav, "123456789012").unwrap();
        let main = doc.append_element(root, "main", &[]).unwrap();
        doc.append_text(main, "123456789012").unwrap();

        annotator.annotate_subtree(&mut doc, nav, &prod(), Scope::Navigation);
        annotator.annotate_subtree(&mut doc, main, &prod(), Scope::PageContent);

        let report = annotator.clear_scope(&mut doc, root, Scope::PageContent);
        assert_eq!(report.cleared, 1);
        assert_eq!(doc.text_content(nav), "123456789012 (Prod)");
        assert_eq!(doc.text_content(main), "123456789012");
        assert!(is_marked(&doc, nav));
        assert!(!is_marked(&doc, main));
    }
}
