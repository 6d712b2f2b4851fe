//! Parsed form of a snippet body

use std::collections::HashSet;

use crate::model::VariableValues;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A run of literal text or a single placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, including braces that do not form a placeholder
    Text(String),
    /// `{{name}}`
    Placeholder(String),
}

/// A snippet body split into literal text and placeholders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub segments: Vec<Spanned<Segment>>,
}

impl Template {
    /// A template with no placeholders at all
    pub fn literal(body: &str) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![Spanned::new(Segment::Text(body.to_string()), 0..body.len())],
        }
    }

    /// Distinct placeholder names in order of first appearance
    pub fn variable_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.placeholders()
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// Every placeholder name, duplicates included
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match &seg.node {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Byte spans of every occurrence of `{{name}}`
    pub fn placeholder_spans(&self, name: &str) -> Vec<Span> {
        self.segments
            .iter()
            .filter(|seg| matches!(&seg.node, Segment::Placeholder(n) if n == name))
            .map(|seg| seg.span.clone())
            .collect()
    }

    /// Replace placeholders found in `values` in a single pass
    ///
    /// Inserted values are never scanned again, and placeholders without a
    /// value are written back verbatim.
    pub fn render(&self, values: &VariableValues) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match &seg.node {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => match values.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                },
            }
        }
        out
    }
}
