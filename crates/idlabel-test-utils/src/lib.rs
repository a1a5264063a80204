//! Testing utilities for the idlabel workspace
//!
//! Shared fixtures: label mappings, locations and a console-like document.

#![allow(missing_docs)]

use idlabel_core::{Identifier, Label, LabelMap};
use idlabel_dom::{ArenaDocument, DocumentTree, Location, NodeId};

pub const PROD_ID: &str = "123456789012";
pub const DEV_ID: &str = "210987654321";
pub const UNREGISTERED_ID: &str = "999999999999";

pub fn mapping(pairs: &[(&str, &str)]) -> LabelMap {
    pairs
        .iter()
        .map(|(id, label)| (Identifier::parse(id).unwrap(), Label::new(*label).unwrap()))
        .collect()
}

/// `123456789012 → Prod`, `210987654321 → Dev`
pub fn sample_mapping() -> LabelMap {
    mapping(&[(PROD_ID, "Prod"), (DEV_ID, "Dev")])
}

pub fn home_location() -> Location {
    Location::new("console.aws.amazon.com", "/console/home")
}

pub fn service_location() -> Location {
    Location::new("console.aws.amazon.com", "/ec2/home")
}

pub fn selector_location() -> Location {
    Location::new("signin.aws.amazon.com", "/saml")
}

/// Handles into [`console_document`]
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNodes {
    pub nav_button: NodeId,
    pub nav_label: NodeId,
    pub main: NodeId,
    pub account: NodeId,
    pub dev_account: NodeId,
    pub code: NodeId,
    pub arn: NodeId,
    pub unregistered: NodeId,
}

/// Console-like page:
///
/// ```text
/// <html>
///   <header><button data-testid="awsc-nav-account-menu-button"><span>Admin @ 1234-5678-9012</span></button></header>
///   <main>
///     <p>Account: 1234-5678-9012</p>
///     <p>Dev 210987654321</p>
///     <pre><code>{"Account": "123456789012"}</code></pre>
///     <p>arn:aws:iam::123456789012:role/x</p>
///     <p>Other 999999999999</p>
///   </main>
/// </html>
/// ```
pub fn console_document(location: Location) -> (ArenaDocument, ConsoleNodes) {
    let mut doc = ArenaDocument::new(location).with_title("Console Home | 123456789012");
    let root = doc.root();

    let header = doc.append_element(root, "header", &[]).unwrap();
    let nav_button = doc
        .append_element(
            header,
            "button",
            &[("data-testid", "awsc-nav-account-menu-button")],
        )
        .unwrap();
    let nav_label = doc.append_element(nav_button, "span", &[]).unwrap();
    doc.append_text(nav_label, "Admin @ 1234-5678-9012").unwrap();

    let main = doc.append_element(root, "main", &[]).unwrap();
    let account = paragraph(&mut doc, main, "Account: 1234-5678-9012");
    let dev_account = paragraph(&mut doc, main, "Dev 210987654321");
    let pre = doc.append_element(main, "pre", &[]).unwrap();
    let code = doc.append_element(pre, "code", &[]).unwrap();
    doc.append_text(code, "{\"Account\": \"123456789012\"}").unwrap();
    let arn = paragraph(&mut doc, main, "arn:aws:iam::123456789012:role/x");
    let unregistered = paragraph(&mut doc, main, "Other 999999999999");

    (
        doc,
        ConsoleNodes {
            nav_button,
            nav_label,
            main,
            account,
            dev_account,
            code,
            arn,
            unregistered,
        },
    )
}

fn paragraph(doc: &mut ArenaDocument, parent: NodeId, text: &str) -> NodeId {
    let p = doc.append_element(parent, "p", &[]).unwrap();
    doc.append_text(p, text).unwrap();
    p
}

/// Number of labeled spans under `node`
pub fn count_spans<D: DocumentTree + ?Sized>(doc: &D, node: NodeId) -> usize {
    doc.descendants(node)
        .into_iter()
        .filter(|&n| doc.tag_name(n) == Some("span") && doc.has_class(n, "idlabel-label"))
        .count()
}
