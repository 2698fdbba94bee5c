//! The XPath subset provider scrapers rely on.
//!
//! Supported: `/` and `//` steps, element names or `*`, predicates `[@a]`,
//! `[@a='v']`, `[contains(@a,'v')]`, `[contains(text(),'v')]`, `[n]`, and a
//! trailing `/@attr` or `/text()`. Name tests are case-insensitive because CDP
//! reports upper-case node names.

use std::collections::HashSet;

use crate::document::DomNode;
use crate::errors::MetadataError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Predicate {
    HasAttr(String),
    AttrEquals(String, String),
    AttrContains(String, String),
    TextContains(String),
    Position(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: Option<String>,
    predicates: Vec<Predicate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Output {
    Node,
    Attr(String),
    Text,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XPath {
    steps: Vec<Step>,
    output: Output,
}

#[derive(Clone, Copy)]
enum Ctx<'a> {
    Document(&'a DomNode),
    Node(&'a DomNode),
}

impl XPath {
    pub fn parse(expr: &str) -> Result<Self, MetadataError> {
        Parser::new(expr).parse()
    }

    /// String values of every match, in document order.
    pub fn evaluate(&self, root: &DomNode) -> Vec<String> {
        let mut contexts = vec![Ctx::Document(root)];
        for step in &self.steps {
            let mut next = Vec::new();
            let mut seen: HashSet<*const DomNode> = HashSet::new();
            for ctx in &contexts {
                let mut candidates = Vec::new();
                match step.axis {
                    Axis::Child => children(*ctx, &mut candidates),
                    Axis::Descendant => descendants(*ctx, &mut candidates),
                }
                let matched = filter_step(step, candidates);
                for node in matched {
                    if seen.insert(node as *const DomNode) {
                        next.push(Ctx::Node(node));
                    }
                }
            }
            contexts = next;
        }

        contexts
            .into_iter()
            .filter_map(|ctx| match ctx {
                Ctx::Document(_) => None,
                Ctx::Node(node) => match &self.output {
                    Output::Node => Some(node.string_value()),
                    Output::Attr(name) => node.attr(name).map(str::to_string),
                    Output::Text => {
                        let direct: String = node
                            .children
                            .iter()
                            .filter(|child| child.is_text())
                            .filter_map(|child| child.node_value.as_deref())
                            .collect();
                        Some(direct)
                    }
                },
            })
            .collect()
    }
}

fn children<'a>(ctx: Ctx<'a>, out: &mut Vec<&'a DomNode>) {
    match ctx {
        Ctx::Document(root) => out.push(root),
        Ctx::Node(node) => out.extend(node.children.iter()),
    }
}

fn descendants<'a>(ctx: Ctx<'a>, out: &mut Vec<&'a DomNode>) {
    fn walk<'a>(node: &'a DomNode, out: &mut Vec<&'a DomNode>) {
        for child in &node.children {
            out.push(child);
            walk(child, out);
        }
    }
    match ctx {
        Ctx::Document(root) => {
            out.push(root);
            walk(root, out);
        }
        Ctx::Node(node) => walk(node, out),
    }
}

fn filter_step<'a>(step: &Step, candidates: Vec<&'a DomNode>) -> Vec<&'a DomNode> {
    let mut matched: Vec<&DomNode> = candidates
        .into_iter()
        .filter(|node| match &step.name {
            Some(name) => node.name_matches(name),
            None => node.is_element(),
        })
        .collect();
    for predicate in &step.predicates {
        matched = match predicate {
            Predicate::Position(index) => matched
                .get(index.saturating_sub(1))
                .copied()
                .into_iter()
                .collect(),
            other => matched
                .into_iter()
                .filter(|node| holds(other, node))
                .collect(),
        };
    }
    matched
}

fn holds(predicate: &Predicate, node: &DomNode) -> bool {
    match predicate {
        Predicate::HasAttr(name) => node.attr(name).is_some(),
        Predicate::AttrEquals(name, value) => node.attr(name) == Some(value.as_str()),
        Predicate::AttrContains(name, value) => node
            .attr(name)
            .map_or(false, |attr| attr.contains(value.as_str())),
        Predicate::TextContains(value) => node.string_value().contains(value.as_str()),
        Predicate::Position(_) => true,
    }
}

struct Parser<'a> {
    expr: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            expr,
            rest: expr.trim(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> MetadataError {
        MetadataError::InvalidXPath {
            expr: self.expr.to_string(),
            reason: reason.into(),
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if let Some(rest) = self.rest.strip_prefix(token) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), MetadataError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{token}' at '{}'", self.rest)))
        }
    }

    fn name(&mut self) -> Result<String, MetadataError> {
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.error(format!("expected a name at '{}'", self.rest)));
        }
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(name.to_string())
    }

    fn literal(&mut self) -> Result<String, MetadataError> {
        let quote = match self.rest.chars().next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error(format!("expected a quoted literal at '{}'", self.rest))),
        };
        let body = &self.rest[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| self.error("unterminated literal"))?;
        let value = body[..end].to_string();
        self.rest = &body[end + 1..];
        Ok(value)
    }

    fn parse(mut self) -> Result<XPath, MetadataError> {
        if !self.rest.starts_with('/') {
            return Err(self.error("expression must start with '/' or '//'"));
        }
        let mut steps = Vec::new();
        let mut output = Output::Node;
        while !self.rest.is_empty() {
            let axis = if self.eat("//") {
                Axis::Descendant
            } else if self.eat("/") {
                Axis::Child
            } else {
                return Err(self.error(format!("unexpected input '{}'", self.rest)));
            };

            if axis == Axis::Child && self.eat("@") {
                output = Output::Attr(self.name()?);
                break;
            }
            if axis == Axis::Child && self.eat("text()") {
                output = Output::Text;
                break;
            }

            let name = if self.eat("*") {
                None
            } else {
                Some(self.name()?)
            };
            let mut predicates = Vec::new();
            while self.eat("[") {
                predicates.push(self.predicate()?);
                self.expect("]")?;
            }
            steps.push(Step {
                axis,
                name,
                predicates,
            });
        }
        if !self.rest.is_empty() {
            return Err(self.error(format!("trailing input '{}'", self.rest)));
        }
        if steps.is_empty() {
            return Err(self.error("expression selects nothing"));
        }
        Ok(XPath { steps, output })
    }

    fn predicate(&mut self) -> Result<Predicate, MetadataError> {
        if self.eat("@") {
            let name = self.name()?;
            if self.eat("=") {
                let value = self.literal()?;
                return Ok(Predicate::AttrEquals(name, value));
            }
            return Ok(Predicate::HasAttr(name));
        }
        if self.eat("contains(") {
            let predicate = if self.eat("@") {
                let name = self.name()?;
                self.expect(",")?;
                self.rest = self.rest.trim_start();
                Predicate::AttrContains(name, self.literal()?)
            } else if self.eat("text()") {
                self.expect(",")?;
                self.rest = self.rest.trim_start();
                Predicate::TextContains(self.literal()?)
            } else {
                return Err(self.error("contains() takes @attr or text()"));
            };
            self.expect(")")?;
            return Ok(predicate);
        }
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let index: usize = self.rest[..end]
            .parse()
            .map_err(|_| self.error(format!("unsupported predicate at '{}'", self.rest)))?;
        if index == 0 {
            return Err(self.error("positions start at 1"));
        }
        self.rest = &self.rest[end..];
        Ok(Predicate::Position(index))
    }
}
