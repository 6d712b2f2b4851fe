//! Fuzzy matching of a query against snippets
//!
//! Scores run from 0.0 (perfect) to 1.0 (nothing in common). A field scores
//! 0.0 when it contains the query; otherwise it scores the best normalized
//! edit distance between the query and any window of the field around the
//! query's length.

use std::fmt;
use std::str::FromStr;

use crate::model::Snippet;

/// Default match threshold
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Snippet fields taking part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Title,
    Body,
    Tags,
    Folder,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Title,
        SearchField::Body,
        SearchField::Tags,
        SearchField::Folder,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Body => "body",
            SearchField::Tags => "tags",
            SearchField::Folder => "folder",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchField::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Matching parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Highest score still counted as a match
    pub threshold: f64,
    /// Fields and their weights; fields not listed are not searched
    pub keys: Vec<(SearchField, f64)>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            keys: SearchField::ALL.iter().map(|&field| (field, 1.0)).collect(),
        }
    }
}

impl SearchConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set a field's weight, adding the field if it was not searched
    pub fn with_key_weight(mut self, field: SearchField, weight: f64) -> Self {
        let weight = weight.clamp(0.0, 1.0);
        match self.keys.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = weight,
            None => self.keys.push((field, weight)),
        }
        self
    }

    pub fn weight(&self, field: SearchField) -> Option<f64> {
        self.keys.iter().find(|(f, _)| *f == field).map(|&(_, w)| w)
    }
}

/// A matching snippet: its position in the indexed list and its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub index: usize,
    pub score: f64,
}

/// Lower-cased field text with its chars collected once for windowing
struct FieldText {
    text: String,
    chars: Vec<char>,
}

impl FieldText {
    fn new(text: String) -> Self {
        let chars = text.chars().collect();
        Self { text, chars }
    }
}

struct Entry {
    fields: Vec<(Vec<FieldText>, f64)>,
}

/// Lower-cased searchable text of a snippet list
///
/// Built once when the palette opens and queried on every keystroke.
pub struct FuzzyIndex {
    entries: Vec<Entry>,
    threshold: f64,
}

impl FuzzyIndex {
    pub fn new(snippets: &[Snippet], config: &SearchConfig) -> Self {
        let entries = snippets
            .iter()
            .map(|snippet| Entry {
                fields: config
                    .keys
                    .iter()
                    .map(|&(field, weight)| (field_values(snippet, field), weight))
                    .collect(),
            })
            .collect();
        Self {
            entries,
            threshold: config.threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches best first; equal scores keep their indexed order
    ///
    /// A blank query matches everything with a score of 0.0.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return (0..self.entries.len())
                .map(|index| SearchHit { index, score: 0.0 })
                .collect();
        }
        let query = query.as_str();
        let query_len = query.chars().count();
        let mut window = String::new();

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let mut score = 1.0_f64;
                for (values, weight) in &entry.fields {
                    for value in values {
                        let raw = text_score(query, query_len, value, &mut window);
                        score = score.min(weighted(raw, *weight));
                    }
                }
                (score <= self.threshold).then_some(SearchHit { index, score })
            })
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits
    }
}

fn field_values(snippet: &Snippet, field: SearchField) -> Vec<FieldText> {
    let values = match field {
        SearchField::Title => vec![snippet.title.to_lowercase()],
        SearchField::Body => vec![snippet.body.to_lowercase()],
        SearchField::Tags => snippet.tags.iter().map(|t| t.to_lowercase()).collect(),
        SearchField::Folder => snippet
            .folder_label()
            .map(|f| vec![f.to_lowercase()])
            .unwrap_or_default(),
    };
    values.into_iter().map(FieldText::new).collect()
}

fn weighted(score: f64, weight: f64) -> f64 {
    1.0 - (1.0 - score) * weight
}

/// Approximate substring distance of `query` within `field`, both lower-cased
///
/// `window` is scratch space reused across calls.
fn text_score(query: &str, query_len: usize, field: &FieldText, window: &mut String) -> f64 {
    if field.text.is_empty() {
        return 1.0;
    }
    if field.text.contains(query) {
        return 0.0;
    }

    let chars = &field.chars;
    if chars.len() <= query_len {
        return 1.0 - strsim::normalized_levenshtein(query, &field.text);
    }

    let mut best = 1.0_f64;
    for len in query_len.saturating_sub(1).max(1)..=query_len + 1 {
        if len > chars.len() {
            break;
        }
        for slice in chars.windows(len) {
            window.clear();
            window.extend(slice);
            best = best.min(1.0 - strsim::normalized_levenshtein(query, window.as_str()));
            if best == 0.0 {
                return best;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewSnippet;
    use pretty_assertions::assert_eq;

    fn snippets() -> Vec<Snippet> {
        vec![
            NewSnippet::new("Code review", "Review this diff for bugs")
                .with_tags(["engineering"])
                .with_id("1"),
            NewSnippet::new("Meeting notes", "Summarize the meeting")
                .with_folder("Work")
                .with_id("2"),
            NewSnippet::new("Translate", "Translate to French")
                .with_tags(["language", "french"])
                .with_id("3"),
        ]
    }

    fn indices(hits: &[SearchHit]) -> Vec<usize> {
        hits.iter().map(|h| h.index).collect()
    }

    #[test]
    fn test_blank_query_returns_all_in_order() {
        let index = FuzzyIndex::new(&snippets(), &SearchConfig::default());
        assert_eq!(indices(&index.search("")), vec![0, 1, 2]);
        assert_eq!(indices(&index.search("   ")), vec![0, 1, 2]);
    }

    #[test]
    fn test_substring_matches_any_field() {
        let index = FuzzyIndex::new(&snippets(), &SearchConfig::default());
        assert_eq!(indices(&index.search("REVIEW")), vec![0]);
        assert_eq!(indices(&index.search("work")), vec![1]);
        assert_eq!(indices(&index.search("french")), vec![2]);
    }

    #[test]
    fn test_typo_tolerance() {
        let index = FuzzyIndex::new(&snippets(), &SearchConfig::default());
        let hits = index.search("meetign");
        assert_eq!(indices(&hits), vec![1]);
        assert!(hits[0].score > 0.0 && hits[0].score <= DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_index_serves_successive_queries() {
        let mut items = snippets();
        items.push(NewSnippet::new("Order", "x").with_tags(["café", "menu"]).with_id("4"));
        let index = FuzzyIndex::new(&items, &SearchConfig::default());

        assert_eq!(indices(&index.search("languge")), vec![2]);
        assert_eq!(indices(&index.search("cafe")), vec![3]);
        assert_eq!(indices(&index.search("menu")), vec![3]);
        assert_eq!(indices(&index.search("languge")), vec![2]);
    }

    #[test]
    fn test_unrelated_query_matches_nothing() {
        let index = FuzzyIndex::new(&snippets(), &SearchConfig::default());
        assert!(index.search("zzzzqqq").is_empty());
    }

    #[test]
    fn test_better_matches_first() {
        let items = vec![
            NewSnippet::new("Summary", "something else").with_id("a"),
            NewSnippet::new("Notes", "summary").with_id("b"),
            NewSnippet::new("Sumary draft", "x").with_id("c"),
        ];
        let index = FuzzyIndex::new(&items, &SearchConfig::default());
        let hits = index.search("summary");
        assert_eq!(indices(&hits), vec![0, 1, 2]);
    }

    #[test]
    fn test_weight_and_field_selection() {
        let config = SearchConfig {
            threshold: DEFAULT_THRESHOLD,
            keys: vec![(SearchField::Title, 1.0)],
        };
        let index = FuzzyIndex::new(&snippets(), &config);
        assert!(index.search("french").is_empty());

        let config = SearchConfig::default().with_key_weight(SearchField::Body, 0.5);
        let index = FuzzyIndex::new(&snippets(), &config);
        assert!(index.search("diff").is_empty());
        assert_eq!(indices(&index.search("code")), vec![0]);
    }

    #[test]
    fn test_field_names() {
        assert_eq!("Tags".parse::<SearchField>(), Ok(SearchField::Tags));
        assert_eq!("nope".parse::<SearchField>(), Err("nope".to_string()));
        assert_eq!(SearchConfig::default().weight(SearchField::Folder), Some(1.0));
    }
}
