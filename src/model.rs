//! Snippet data model shared by the storage layer, the palette and the CLI

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Folder label used when grouping snippets that have none
pub const UNGROUPED_FOLDER: &str = "Ungrouped";

/// Activation key used when no settings have been stored yet
pub const DEFAULT_ACTIVATOR_KEY: &str = "/";

/// Values collected for a snippet's variables, keyed by variable name
pub type VariableValues = HashMap<String, String>;

/// A stored prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Opaque unique identifier assigned by the store
    pub id: String,
    pub title: String,
    /// Raw text, may contain `{{name}}` placeholders
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Free-form abbreviation shown next to the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Declared metadata for the body's placeholders
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDeclaration>,
}

impl Snippet {
    /// Report declarations with malformed or repeated names
    ///
    /// The template engine tolerates both (invalid names never match, the
    /// first duplicate wins), so this is only used by callers that want to
    /// reject such data before it is stored.
    pub fn check_declarations(&self) -> Vec<DeclarationIssue> {
        check_declarations(&self.variables)
    }

    /// Folder label, or `None` when unset or blank
    pub fn folder_label(&self) -> Option<&str> {
        self.folder.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

/// A snippet that has not been assigned an identifier yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSnippet {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDeclaration>,
}

impl NewSnippet {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    pub fn with_variable(mut self, declaration: VariableDeclaration) -> Self {
        self.variables.push(declaration);
        self
    }

    /// Attach an identifier, producing a storable snippet
    pub fn with_id(self, id: impl Into<String>) -> Snippet {
        Snippet {
            id: id.into(),
            title: self.title,
            body: self.body,
            tags: self.tags,
            shortcut: self.shortcut,
            folder: self.folder,
            variables: self.variables,
        }
    }
}

impl From<Snippet> for NewSnippet {
    fn from(snippet: Snippet) -> Self {
        Self {
            title: snippet.title,
            body: snippet.body,
            tags: snippet.tags,
            shortcut: snippet.shortcut,
            folder: snippet.folder,
            variables: snippet.variables,
        }
    }
}

/// Metadata declared for one placeholder name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_value: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Whether `name` is identifier-shaped: `[A-Za-z_][A-Za-z0-9_]*`
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// A body placeholder reconciled against the snippet's declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ResolvedVariable {
    /// A placeholder with no matching declaration
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_value: None,
        }
    }
}

impl From<&VariableDeclaration> for ResolvedVariable {
    fn from(decl: &VariableDeclaration) -> Self {
        Self {
            name: decl.name.clone(),
            description: decl.description.clone(),
            default_value: decl.default_value.clone(),
        }
    }
}

/// Problems found in a snippet's variable declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationIssue {
    /// Name does not follow the identifier grammar and can never match
    InvalidName { name: String },
    /// Name declared more than once; only the first declaration is used
    Duplicate { name: String },
}

impl std::fmt::Display for DeclarationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationIssue::InvalidName { name } => {
                write!(f, "variable name '{}' is not a valid identifier", name)
            }
            DeclarationIssue::Duplicate { name } => {
                write!(f, "variable '{}' is declared more than once", name)
            }
        }
    }
}

fn check_declarations(declarations: &[VariableDeclaration]) -> Vec<DeclarationIssue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    for decl in declarations {
        if !VariableDeclaration::is_valid_name(&decl.name) {
            issues.push(DeclarationIssue::InvalidName {
                name: decl.name.clone(),
            });
        } else if !seen.insert(decl.name.as_str()) {
            issues.push(DeclarationIssue::Duplicate {
                name: decl.name.clone(),
            });
        }
    }
    issues
}

/// User settings persisted next to the snippets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Key chord that opens the palette, e.g. `/` or `ctrl+space`
    pub activator_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            activator_key: DEFAULT_ACTIVATOR_KEY.to_string(),
        }
    }
}

impl Settings {
    /// Apply a partial update, returning the merged settings
    pub fn merged(mut self, patch: SettingsPatch) -> Self {
        if let Some(key) = patch.activator_key {
            self.activator_key = key;
        }
        self
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activator_key: Option<String>,
}

/// Distinct folder labels, sorted case-insensitively
pub fn folders(snippets: &[Snippet]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result: Vec<String> = snippets
        .iter()
        .filter_map(Snippet::folder_label)
        .filter(|folder| seen.insert(folder.to_string()))
        .map(str::to_string)
        .collect();
    result.sort_by_key(|f| f.to_lowercase());
    result
}

/// Group snippets by folder, folders alphabetical with [`UNGROUPED_FOLDER`] last
pub fn group_by_folder(snippets: &[Snippet]) -> Vec<(String, Vec<&Snippet>)> {
    let mut groups: BTreeMap<String, Vec<&Snippet>> = BTreeMap::new();
    let mut ungrouped = Vec::new();
    for snippet in snippets {
        match snippet.folder_label() {
            Some(folder) => groups.entry(folder.to_string()).or_default().push(snippet),
            None => ungrouped.push(snippet),
        }
    }

    let mut result: Vec<(String, Vec<&Snippet>)> = groups.into_iter().collect();
    result.sort_by_key(|(folder, _)| folder.to_lowercase());
    if !ungrouped.is_empty() {
        result.push((UNGROUPED_FOLDER.to_string(), ungrouped));
    }
    result
}
