//! Export and import of the snippet collection
//!
//! The export format is a JSON object:
//!
//! ```json
//! { "version": "1.0", "exportedAt": "2024-01-01T00:00:00Z", "snippets": [ ... ] }
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::{NewSnippet, Snippet};

/// Format version written by [`export_document`]
pub const EXPORT_VERSION: &str = "1.0";

/// Serialized form of an export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub snippets: Vec<Snippet>,
}

impl ExportDocument {
    pub fn new(snippets: Vec<Snippet>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            snippets,
        }
    }
}

/// Serialize snippets as a pretty-printed export document
pub fn export_document(snippets: &[Snippet]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ExportDocument::new(snippets.to_vec()))
}

/// How an import combines with the existing collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Keep existing snippets and skip incoming ones with a known title
    pub merge: bool,
}

impl ImportOptions {
    pub fn replace() -> Self {
        Self { merge: false }
    }

    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// The document was readable and the result was stored
    pub success: bool,
    pub imported_count: usize,
    /// Incoming snippets dropped as duplicates during a merge
    pub skipped_count: usize,
    /// One entry per rejected record, or the document-level failure
    pub errors: Vec<String>,
}

impl ImportReport {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Self::default()
        }
    }
}

/// The collection an import would produce, plus its report
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub snippets: Vec<Snippet>,
    pub report: ImportReport,
}

/// Generate a fresh snippet identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Compute the result of importing `data` on top of `existing`
///
/// Nothing is written; when the document itself is unreadable the plan keeps
/// `existing` untouched and reports failure.
pub fn plan_import(
    data: &str,
    existing: &[Snippet],
    options: ImportOptions,
    mut next_id: impl FnMut() -> String,
) -> ImportPlan {
    let unchanged = |report| ImportPlan {
        snippets: existing.to_vec(),
        report,
    };

    let document: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => return unchanged(ImportReport::failed(format!("Invalid JSON: {}", e))),
    };

    let records = match document.get("snippets").and_then(Value::as_array) {
        Some(records) => records,
        None => {
            return unchanged(ImportReport::failed(
                "Invalid format: expected a \"snippets\" array",
            ))
        }
    };

    match document.get("version").and_then(Value::as_str) {
        Some(EXPORT_VERSION) => {}
        other => warn!(version = ?other, "importing document with unexpected version"),
    }

    let mut known_titles: HashSet<String> = if options.merge {
        existing.iter().map(|s| s.title.to_lowercase()).collect()
    } else {
        HashSet::new()
    };

    let mut report = ImportReport {
        success: true,
        ..ImportReport::default()
    };
    let mut imported = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let snippet = match parse_record(record) {
            Ok(snippet) => snippet,
            Err(reason) => {
                report.errors.push(format!("Snippet {}: {}", index + 1, reason));
                continue;
            }
        };

        if options.merge && !known_titles.insert(snippet.title.to_lowercase()) {
            report.skipped_count += 1;
            continue;
        }

        imported.push(snippet.with_id(next_id()));
    }

    report.imported_count = imported.len();
    let snippets = if options.merge {
        existing.iter().cloned().chain(imported).collect()
    } else {
        imported
    };

    ImportPlan { snippets, report }
}

fn parse_record(record: &Value) -> Result<NewSnippet, String> {
    let object = record.as_object().ok_or("missing title or body")?;
    let has_text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty())
    };
    if !has_text("title") || !has_text("body") {
        return Err("missing title or body".to_string());
    }
    // Incoming ids are discarded; NewSnippet has no id field to receive one
    serde_json::from_value(record.clone()).map_err(|e| e.to_string())
}
