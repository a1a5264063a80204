//! Scope classification
//!
//! Decides which parts of a document may be annotated:
//!
//! - **Exclusion**: nodes inside code, structured-data or ARN containers, or
//!   whose text carries an ARN literal, are never touched
//! - **Scope selector set**: a narrow navigation scope (always annotated) and
//!   a broad page-content scope (only on home/selector views)
//! - **Location**: home and account-selector detection

use crate::error::SelectorError;
use crate::location::Location;
use crate::selector::{query_all, SelectorList};
use crate::tree::{DocumentTree, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// Annotation scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Account menus and headers, annotated on every page
    Navigation,
    /// Main page body, annotated on home/selector views only
    PageContent,
}

impl Scope {
    /// Both scopes, navigation first
    pub const ALL: [Scope; 2] = [Scope::Navigation, Scope::PageContent];

    /// Short name used in markup
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "nav",
            Self::PageContent => "page",
        }
    }

    /// Inverse of [`Scope::as_str`]
    #[must_use]
    pub fn from_marker(value: &str) -> Option<Self> {
        match value {
            "nav" => Some(Self::Navigation),
            "page" => Some(Self::PageContent),
            _ => None,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of page, tagged on the document root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Console home
    Home,
    /// Sign-in account/role selector
    Selector,
}

impl PageKind {
    /// Tag value written to the root
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Selector => "selector",
        }
    }
}

impl Display for PageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location classification result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationClass {
    /// Navigation scope is always annotated
    pub navigation_always: bool,
    /// Whether the page-content scope is annotated here
    pub page_content_eligible: bool,
}

/// Static scope configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Selectors for the navigation scope
    pub navigation_selectors: Vec<String>,
    /// Selectors for the page-content scope
    pub page_content_selectors: Vec<String>,
    /// Selectors for regions that must never be rewritten
    pub exclusion_selectors: Vec<String>,
    /// ARN literal prefixes that exclude a node by its text
    pub arn_prefixes: Vec<String>,
    /// Home paths (trailing `/` ignored)
    pub home_paths: Vec<String>,
    /// Sign-in hosts; a leading `*.` matches any subdomain
    pub signin_hosts: Vec<String>,
    /// Path prefixes of the account selector view
    pub selector_paths: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            navigation_selectors: strings(&[
                "[data-testid=\"awsc-nav-account-menu-button\"]",
                "[data-testid=\"account-detail-menu\"]",
                "#menu--account",
                "#nav-usernameMenu",
            ]),
            page_content_selectors: strings(&["main", "[role=\"main\"]", "#app", "#content", "fieldset"]),
            exclusion_selectors: strings(&[
                "code",
                "pre",
                "script",
                "style",
                "textarea",
                "input",
                "[contenteditable]",
                ".arn",
                ".resource-arn",
                "[data-arn]",
                "[data-testid$=\"-arn\"]",
                "[class*=\"json\"]",
                "[class*=\"code-editor\"]",
                ".idlabel-label",
            ]),
            arn_prefixes: strings(&["arn:aws:", "arn:aws-cn:", "arn:aws-us-gov:"]),
            home_paths: strings(&["/console/home", "/console"]),
            signin_hosts: strings(&["signin.aws.amazon.com", "*.awsapps.com"]),
            selector_paths: strings(&["/saml", "/start"]),
        }
    }
}

/// Navigation and page-content selectors
#[derive(Debug, Clone)]
pub struct ScopeSelectorSet {
    navigation: SelectorList,
    page_content: SelectorList,
}

impl ScopeSelectorSet {
    /// Parse both selector lists
    ///
    /// # Errors
    /// Returns the first [`SelectorError`]
    pub fn from_config(config: &ScopeConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            navigation: SelectorList::parse_all(&config.navigation_selectors)?,
            page_content: SelectorList::parse_all(&config.page_content_selectors)?,
        })
    }

    /// Selectors of one scope
    #[must_use]
    pub fn selectors(&self, scope: Scope) -> &SelectorList {
        match scope {
            Scope::Navigation => &self.navigation,
            Scope::PageContent => &self.page_content,
        }
    }

    /// Outermost elements matching `scope`, in document order
    ///
    /// Nested matches are dropped; their content is covered by the outer root.
    pub fn roots<D: DocumentTree + ?Sized>(&self, tree: &D, scope: Scope) -> Vec<NodeId> {
        let matches = query_all(tree, tree.root(), self.selectors(scope));
        matches
            .iter()
            .copied()
            .filter(|&node| !tree.ancestors(node).iter().any(|a| matches.contains(a)))
            .collect()
    }
}

/// Scope classifier
#[derive(Debug, Clone)]
pub struct ScopeClassifier {
    selectors: ScopeSelectorSet,
    exclusions: SelectorList,
    arn_prefixes: Vec<String>,
    home_paths: Vec<String>,
    signin_hosts: Vec<String>,
    selector_paths: Vec<String>,
}

impl ScopeClassifier {
    /// Build from configuration
    ///
    /// # Errors
    /// Fails if any selector does not parse
    pub fn from_config(config: &ScopeConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            selectors: ScopeSelectorSet::from_config(config)?,
            exclusions: SelectorList::parse_all(&config.exclusion_selectors)?,
            arn_prefixes: config.arn_prefixes.clone(),
            home_paths: config
                .home_paths
                .iter()
                .map(|p| trim_path(p).to_string())
                .collect(),
            signin_hosts: config
                .signin_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            selector_paths: config.selector_paths.clone(),
        })
    }

    /// Scope selector set
    #[inline]
    #[must_use]
    pub fn selector_set(&self) -> &ScopeSelectorSet {
        &self.selectors
    }

    /// Whether `node` must not be rewritten
    ///
    /// True when the node (text nodes: their parent) or any ancestor matches
    /// an exclusion selector, or when its text content holds an ARN literal.
    pub fn is_excluded<D: DocumentTree + ?Sized>(&self, tree: &D, node: NodeId) -> bool {
        if tree.kind(node).is_none() {
            return true;
        }
        let structural = std::iter::once(node)
            .chain(tree.ancestors(node))
            .filter(|&n| tree.is_element(n))
            .any(|n| self.exclusions.matches(tree, n));
        if structural {
            debug!(%node, "excluded by selector");
            return true;
        }
        self.contains_arn(&tree.text_content(node))
    }

    /// Whether `text` holds one of the ARN prefixes
    #[must_use]
    pub fn contains_arn(&self, text: &str) -> bool {
        self.arn_prefixes.iter().any(|p| text.contains(p.as_str()))
    }

    /// Scope eligibility at `location`
    #[must_use]
    pub fn classify_location(&self, location: &Location) -> LocationClass {
        let eligible = self.is_home_path(&location.path)
            || self.is_selector_path(&location.path)
            || self.is_signin_host(&location.host);
        LocationClass {
            navigation_always: true,
            page_content_eligible: eligible,
        }
    }

    /// Page kind at `location`, if any
    #[must_use]
    pub fn detect_page_kind(&self, location: &Location) -> Option<PageKind> {
        if self.is_signin_host(&location.host) && self.is_selector_path(&location.path) {
            Some(PageKind::Selector)
        } else if self.is_home_path(&location.path) {
            Some(PageKind::Home)
        } else {
            None
        }
    }

    /// Scopes to annotate at `location`, navigation first
    #[must_use]
    pub fn scopes(&self, location: &Location) -> Vec<Scope> {
        let class = self.classify_location(location);
        Scope::ALL
            .into_iter()
            .filter(|scope| match scope {
                Scope::Navigation => class.navigation_always,
                Scope::PageContent => class.page_content_eligible,
            })
            .collect()
    }

    fn is_home_path(&self, path: &str) -> bool {
        let path = trim_path(path);
        self.home_paths.iter().any(|p| p == path)
    }

    fn is_selector_path(&self, path: &str) -> bool {
        self.selector_paths.iter().any(|p| path.starts_with(p.as_str()))
    }

    fn is_signin_host(&self, host: &str) -> bool {
        self.signin_hosts.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(domain) => host
                .strip_suffix(domain)
                .is_some_and(|sub| sub.ends_with('.') && sub.len() > 1),
            None => host == pattern,
        })
    }
}

fn trim_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
