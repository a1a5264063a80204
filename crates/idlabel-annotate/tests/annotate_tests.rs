//! Annotator behavior on a console-like document

use idlabel_annotate::markers::{is_marked, MARK_ATTR};
use idlabel_annotate::{AnnotateOutcome, Annotator};
use idlabel_dom::{ArenaDocument, DocumentTree, Location, Scope, ScopeClassifier, ScopeConfig};
use idlabel_test_utils::{console_document, count_spans, home_location, mapping, sample_mapping};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn annotator() -> Annotator {
    Annotator::new(ScopeClassifier::from_config(&ScopeConfig::default()).unwrap())
}

fn annotate_all(annotator: &Annotator, doc: &mut ArenaDocument) {
    let mapping = sample_mapping();
    let set = annotator.classifier().selector_set().clone();
    for scope in Scope::ALL {
        for root in set.roots(doc, scope) {
            annotator.annotate_subtree(doc, root, &mapping, scope);
        }
    }
}

#[test]
fn end_to_end_account_label() {
    let (mut doc, nodes) = console_document(home_location());
    let annotator = annotator();
    let report = annotator.annotate_subtree(
        &mut doc,
        nodes.main,
        &mapping(&[("123456789012", "Prod")]),
        Scope::PageContent,
    );

    assert_eq!(doc.text_content(nodes.account), "Account: 1234-5678-9012 (Prod)");
    assert_eq!(
        doc.outer_html(nodes.account),
        "<p data-idlabel-processed=\"page\">Account: 1234-5678-9012 \
         <span class=\"idlabel-label\" data-idlabel-scope=\"page\">(Prod)</span></p>"
    );
    assert!(is_marked(&doc, nodes.account));
    assert_eq!(report.rewritten, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn both_scopes_on_home() {
    let (mut doc, nodes) = console_document(home_location());
    annotate_all(&annotator(), &mut doc);

    assert_eq!(doc.text_content(nodes.nav_label), "Admin @ 1234-5678-9012 (Prod)");
    assert_eq!(doc.text_content(nodes.dev_account), "Dev 210987654321 (Dev)");
    assert_eq!(doc.text_content(nodes.unregistered), "Other 999999999999");
    assert_eq!(doc.title(), "Console Home | 123456789012 (Prod)");
    assert_eq!(count_spans(&doc, doc.root()), 3);
    assert_eq!(doc.attribute(nodes.nav_label, MARK_ATTR), Some("nav"));
    assert_eq!(doc.attribute(nodes.account, MARK_ATTR), Some("page"));
}

#[test]
fn excluded_regions_stay_byte_identical() {
    let (mut doc, nodes) = console_document(home_location());
    let code_before = doc.outer_html(nodes.code);
    let arn_before = doc.outer_html(nodes.arn);

    let annotator = annotator();
    annotate_all(&annotator, &mut doc);
    let mapping = sample_mapping();
    assert_eq!(
        annotator
            .annotate(&mut doc, nodes.code, &mapping, Scope::PageContent)
            .unwrap(),
        AnnotateOutcome::Excluded
    );
    assert_eq!(
        annotator
            .annotate(&mut doc, nodes.arn, &mapping, Scope::PageContent)
            .unwrap(),
        AnnotateOutcome::Excluded
    );

    assert_eq!(doc.outer_html(nodes.code), code_before);
    assert_eq!(doc.outer_html(nodes.arn), arn_before);
    assert_eq!(doc.text_content(nodes.arn), "arn:aws:iam::123456789012:role/x");
}

#[test]
fn repeated_passes_do_not_double_label() {
    let (mut doc, _) = console_document(home_location());
    let annotator = annotator();
    annotate_all(&annotator, &mut doc);
    let once = doc.outer_html(doc.root());

    annotate_all(&annotator, &mut doc);
    assert_eq!(doc.outer_html(doc.root()), once);
}

#[test]
fn clear_restores_whole_document() {
    let (mut doc, _) = console_document(home_location());
    let before = doc.outer_html(doc.root());
    let title = doc.title().to_string();

    let annotator = annotator();
    annotate_all(&annotator, &mut doc);
    let root = doc.root();
    let report = annotator.clear(&mut doc, root);
    assert!(annotator.restore_title(&mut doc));

    assert_eq!(report.cleared, 3);
    assert_eq!(doc.outer_html(root), before);
    assert_eq!(doc.title(), title);
}

#[test]
fn page_scope_can_be_cleared_alone() {
    let (mut doc, nodes) = console_document(home_location());
    let annotator = annotator();
    annotate_all(&annotator, &mut doc);

    let root = doc.root();
    annotator.clear_scope(&mut doc, root, Scope::PageContent);

    assert_eq!(count_spans(&doc, nodes.main), 0);
    assert_eq!(count_spans(&doc, nodes.nav_button), 1);
    assert_eq!(doc.text_content(nodes.account), "Account: 1234-5678-9012");
}

fn text_strategy() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("123456789012".to_string()),
        Just("2109-8765-4321".to_string()),
        Just("999999999999".to_string()),
        Just("(Dev)".to_string()),
        "[a-zA-Z:@ ]{0,8}",
    ];
    prop::collection::vec(piece, 1..6).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn clear_reverses_annotate(text in text_strategy()) {
        let mut doc = ArenaDocument::new(Location::new("console.aws.amazon.com", "/console/home"));
        let root = doc.root();
        let main = doc.append_element(root, "main", &[]).unwrap();
        let p = doc.append_element(main, "p", &[]).unwrap();
        doc.append_text(p, &text).unwrap();
        let before = doc.outer_html(root);

        let annotator = annotator();
        annotator.annotate(&mut doc, p, &sample_mapping(), Scope::PageContent).unwrap();
        annotator.clear(&mut doc, root);

        prop_assert_eq!(doc.text_content(p), text);
        prop_assert_eq!(doc.outer_html(root), before);
    }
}
