//! Structural selectors
//!
//! A small subset of CSS selector syntax, enough to describe scope and
//! exclusion sets:
//!
//! - comma-separated lists: `code, pre`
//! - descendant combinator: `header nav`
//! - compound parts: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`,
//!   `[attr^=v]`, `[attr$=v]`, `[attr*=v]` (values quoted or bare)

use crate::error::SelectorError;
use crate::tree::{DocumentTree, NodeId};
use std::str::FromStr;

/// Attribute comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeCondition {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttributeCondition {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Prefix => actual.starts_with(&self.value),
            AttrOp::Suffix => actual.ends_with(&self.value),
            AttrOp::Contains => actual.contains(&self.value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeCondition>,
}

impl Compound {
    fn matches<D: DocumentTree + ?Sized>(&self, tree: &D, node: NodeId) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if let Some(id) = &self.id {
            if tree.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| tree.has_class(node, c))
            && self
                .attributes
                .iter()
                .all(|a| a.matches(tree.attribute(node, &a.name)))
    }
}

/// One selector: compounds joined by descendant combinators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Whether the element `node` matches
    pub fn matches<D: DocumentTree + ?Sized>(&self, tree: &D, node: NodeId) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(tree, node) {
            return false;
        }
        // Greedy right-to-left is exact for descendant-only chains.
        let mut ancestors = tree.ancestors(node).into_iter();
        rest.iter()
            .rev()
            .all(|compound| ancestors.any(|a| compound.matches(tree, a)))
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorList(Vec<Selector>);

impl SelectorList {
    /// Parse and concatenate several selector strings
    ///
    /// # Errors
    /// Returns the first [`SelectorError`]
    pub fn parse_all<S: AsRef<str>>(sources: &[S]) -> Result<Self, SelectorError> {
        let mut selectors = Vec::new();
        for source in sources {
            selectors.extend(source.as_ref().parse::<SelectorList>()?.0);
        }
        Ok(Self(selectors))
    }

    /// Whether any selector matches `node`
    pub fn matches<D: DocumentTree + ?Sized>(&self, tree: &D, node: NodeId) -> bool {
        self.0.iter().any(|s| s.matches(tree, node))
    }

    /// Number of selectors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let mut selectors = Vec::new();
        loop {
            parser.skip_ws();
            selectors.push(parser.selector()?);
            parser.skip_ws();
            match parser.peek() {
                None => break,
                Some(',') => {
                    parser.bump();
                }
                Some(c) => return Err(parser.unexpected(c)),
            }
        }
        Ok(Self(selectors))
    }
}

/// Elements under `root` (inclusive) matching `selectors`, in document order
pub fn query_all<D: DocumentTree + ?Sized>(
    tree: &D,
    root: NodeId,
    selectors: &SelectorList,
) -> Vec<NodeId> {
    std::iter::once(root)
        .chain(tree.descendants(root))
        .filter(|&n| tree.is_element(n) && selectors.matches(tree, n))
        .collect()
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            found,
            position: self.pos,
        }
    }

    fn unterminated(&self) -> SelectorError {
        SelectorError::UnterminatedAttribute(self.source.to_string())
    }

    fn required_ident(&mut self) -> Result<String, SelectorError> {
        match self.ident() {
            Some(name) => Ok(name),
            None => Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => SelectorError::Empty,
            }),
        }
    }

    fn selector(&mut self) -> Result<Selector, SelectorError> {
        let mut compounds = vec![self.compound()?];
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some(_) if had_ws => compounds.push(self.compound()?),
                Some(c) => return Err(self.unexpected(c)),
            }
        }
        Ok(Selector { compounds })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.peek() == Some('*') {
            self.bump();
            any = true;
        } else if let Some(tag) = self.ident() {
            compound.tag = Some(tag.to_ascii_lowercase());
            any = true;
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.required_ident()?);
                }
                Some('.') => {
                    self.bump();
                    let class = self.required_ident()?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.bump();
                    let condition = self.attribute()?;
                    compound.attributes.push(condition);
                }
                _ => break,
            }
            any = true;
        }

        if any {
            Ok(compound)
        } else {
            Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => SelectorError::Empty,
            })
        }
    }

    fn attribute(&mut self) -> Result<AttributeCondition, SelectorError> {
        self.skip_ws();
        let name = match self.ident() {
            Some(name) => name,
            None => {
                return Err(match self.peek() {
                    Some(c) => self.unexpected(c),
                    None => self.unterminated(),
                })
            }
        };
        self.skip_ws();

        let op = match self.bump() {
            Some(']') => {
                return Ok(AttributeCondition {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                })
            }
            Some('=') => AttrOp::Equals,
            Some(c @ ('^' | '$' | '*')) => {
                match self.bump() {
                    Some('=') => {}
                    Some(other) => {
                        self.pos -= 1;
                        return Err(self.unexpected(other));
                    }
                    None => return Err(self.unterminated()),
                }
                match c {
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Contains,
                }
            }
            Some(c) => {
                self.pos -= 1;
                return Err(self.unexpected(c));
            }
            None => return Err(self.unterminated()),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.bump().is_none() {
                    return Err(self.unterminated());
                }
                self.chars[start..self.pos - 1].iter().collect()
            }
            Some(_) => self.required_ident()?,
            None => return Err(self.unterminated()),
        };

        self.skip_ws();
        match self.bump() {
            Some(']') => Ok(AttributeCondition { name, op, value }),
            Some(c) => {
                self.pos -= 1;
                Err(self.unexpected(c))
            }
            None => Err(self.unterminated()),
        }
    }
}
