//! Queryable view over a fetched console page.
//!
//! Thin wrapper over `scraper` exposing only what the extractors need:
//! selector search, scoped sub-search, text and attribute access. Searches
//! never fail; an unmatched or invalid selector yields an empty [`Nodes`].

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::{ConsoleError, Result};

pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a response body. Malformed markup is accepted as-is; only bodies
    /// that are empty or contain no markup at all are rejected.
    pub fn parse(body: &str) -> Result<Self> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(ConsoleError::Parse("body is empty".to_string()));
        }
        if !trimmed.contains('<') {
            return Err(ConsoleError::Parse(format!(
                "no markup found in {} byte body",
                body.len()
            )));
        }
        Ok(Self {
            html: Html::parse_document(body),
        })
    }

    pub fn find(&self, selector: &str) -> Nodes<'_> {
        let Some(selector) = compile(selector) else {
            return Nodes::default();
        };
        Nodes(self.html.select(&selector).map(Node).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// Descendants of this node matching `selector`, in document order. The
    /// node itself is never part of the result.
    pub fn find(&self, selector: &str) -> Nodes<'a> {
        let Some(selector) = compile(selector) else {
            return Nodes::default();
        };
        let scope = self.0.id();
        Nodes(
            self.0
                .select(&selector)
                .filter(|element| element.id() != scope)
                .map(Node)
                .collect(),
        )
    }

    /// Raw concatenated text of the subtree; see [`normalize_text`].
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Nodes<'a>(Vec<Node<'a>>);

impl<'a> Nodes<'a> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nth(&self, index: usize) -> Option<Node<'a>> {
        self.0.get(index).copied()
    }

    pub fn first(&self) -> Option<Node<'a>> {
        self.nth(0)
    }

    pub fn last(&self) -> Option<Node<'a>> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Node<'a>> + '_ {
        self.0.iter().copied()
    }

    /// Union of descendant matches across every node, each element once.
    pub fn find(&self, selector: &str) -> Nodes<'a> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for node in &self.0 {
            for found in node.find(selector).0 {
                if seen.insert(found.0.id()) {
                    out.push(found);
                }
            }
        }
        Nodes(out)
    }

    /// Concatenated text of every node.
    pub fn text(&self) -> String {
        self.0.iter().map(Node::text).collect()
    }

    /// Attribute of the first node carrying it.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.iter().find_map(|node| node.attr(name))
    }
}

impl<'a> IntoIterator for Nodes<'a> {
    type Item = Node<'a>;
    type IntoIter = std::vec::IntoIter<Node<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_text(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_was_space = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !previous_was_space {
                output.push(' ');
                previous_was_space = true;
            }
        } else {
            output.push(ch);
            previous_was_space = false;
        }
    }
    output.trim().to_string()
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(error) => {
            warn!(selector, %error, "invalid selector, treating as no match");
            None
        }
    }
}
