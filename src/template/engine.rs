//! Placeholder extraction, reconciliation and substitution

use ariadne::ReportKind;
use tracing::warn;

use crate::error::render_report;
use crate::model::{ResolvedVariable, Snippet, VariableDeclaration, VariableValues};

use super::ast::Template;
use super::grammar;

impl Template {
    /// Parse a snippet body
    ///
    /// The lexer accepts every input, so this only falls back to a literal
    /// template if the grammar itself rejects the token stream.
    pub fn parse(body: &str) -> Self {
        match grammar::parse(body) {
            Ok(template) => template,
            Err(errors) => {
                warn!(count = errors.len(), "snippet body failed to parse, treating as literal text");
                Template::literal(body)
            }
        }
    }
}

/// Distinct placeholder names in order of first appearance
pub fn extract_variable_names(body: &str) -> Vec<String> {
    Template::parse(body).variable_names()
}

/// Whether the body has at least one placeholder
pub fn has_variables(body: &str) -> bool {
    Template::parse(body).placeholders().next().is_some()
}

/// Reconcile the body's placeholders with declared metadata
///
/// One entry per distinct placeholder, in extraction order. When a name is
/// declared more than once the first declaration wins.
pub fn resolve_variables(body: &str, declarations: &[VariableDeclaration]) -> Vec<ResolvedVariable> {
    extract_variable_names(body)
        .into_iter()
        .map(|name| {
            declarations
                .iter()
                .find(|decl| decl.name == name)
                .map(ResolvedVariable::from)
                .unwrap_or_else(|| ResolvedVariable::bare(name))
        })
        .collect()
}

/// Replace every `{{name}}` whose name is in `values`
///
/// Substituted text is never expanded again; placeholders with no value stay
/// as written.
pub fn substitute(body: &str, values: &VariableValues) -> String {
    if values.is_empty() {
        return body.to_string();
    }
    Template::parse(body).render(values)
}

/// Outcome of checking a body against its declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    /// Placeholders without a declaration, in extraction order
    pub missing_names: Vec<String>,
}

/// Check that every placeholder in the body has a declaration
pub fn validate(body: &str, declarations: &[VariableDeclaration]) -> Validation {
    let missing_names: Vec<String> = extract_variable_names(body)
        .into_iter()
        .filter(|name| !declarations.iter().any(|decl| &decl.name == name))
        .collect();

    Validation {
        valid: missing_names.is_empty(),
        missing_names,
    }
}

impl Validation {
    /// Render a warning that points at every undeclared placeholder
    ///
    /// Returns an empty string when the body is valid.
    pub fn report(&self, body: &str, source_name: &str, color: bool) -> String {
        if self.valid {
            return String::new();
        }

        let template = Template::parse(body);
        let labels: Vec<_> = self
            .missing_names
            .iter()
            .flat_map(|name| {
                template
                    .placeholder_spans(name)
                    .into_iter()
                    .map(move |span| (span, format!("'{}' has no declaration", name)))
            })
            .collect();

        let message = format!(
            "{} undeclared variable{}: {}",
            self.missing_names.len(),
            if self.missing_names.len() == 1 { "" } else { "s" },
            self.missing_names.join(", ")
        );
        render_report(ReportKind::Warning, body, source_name, &message, &labels, color)
    }
}

impl Snippet {
    /// Variables to collect before this snippet can be inserted
    pub fn resolved_variables(&self) -> Vec<ResolvedVariable> {
        resolve_variables(&self.body, &self.variables)
    }

    pub fn has_variables(&self) -> bool {
        has_variables(&self.body)
    }

    /// Body with `values` substituted
    pub fn render(&self, values: &VariableValues) -> String {
        substitute(&self.body, values)
    }

    pub fn validate(&self) -> Validation {
        validate(&self.body, &self.variables)
    }
}
