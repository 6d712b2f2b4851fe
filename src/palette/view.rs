//! What the palette shows, independent of how a host draws it

use crate::model::Snippet;
use crate::template::has_variables;

/// Characters of the body shown under each title
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// One row of the result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub folder: Option<String>,
    pub tags: Vec<String>,
    pub shortcut: Option<String>,
    /// Selecting this entry opens the variable form
    pub has_variables: bool,
    pub selected: bool,
}

impl EntryView {
    pub(crate) fn new(snippet: &Snippet, preview_length: usize, selected: bool) -> Self {
        Self {
            id: snippet.id.clone(),
            title: snippet.title.clone(),
            preview: preview(&snippet.body, preview_length),
            folder: snippet.folder_label().map(str::to_string),
            tags: snippet.tags.clone(),
            shortcut: snippet.shortcut.clone(),
            has_variables: has_variables(&snippet.body),
            selected,
        }
    }
}

/// Placeholder shown instead of an empty list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The store has no snippets at all
    NoSnippets,
    /// The query filtered everything out
    NoMatches,
}

impl EmptyState {
    pub fn title(&self) -> &'static str {
        match self {
            EmptyState::NoSnippets => "No snippets found",
            EmptyState::NoMatches => "No matches found",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            EmptyState::NoSnippets => "Add snippets in the extension options to get started",
            EmptyState::NoMatches => "Try adjusting your search terms",
        }
    }
}

/// Snapshot of the open palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteView {
    pub query: String,
    pub entries: Vec<EntryView>,
    pub empty: Option<EmptyState>,
}

impl PaletteView {
    pub fn selected(&self) -> Option<&EntryView> {
        self.entries.iter().find(|e| e.selected)
    }
}

/// First `max` characters of `body`, with `...` appended when cut
pub fn preview(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
