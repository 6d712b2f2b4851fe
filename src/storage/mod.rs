//! Persistence for snippets and settings
//!
//! The core never talks to a concrete database. It reads and writes through
//! [`SnippetStore`] and [`SettingsStore`]; the bundled implementations keep
//! everything under two keys of a small key-value area ([`KeyValueBackend`]),
//! the same shape a browser extension's local storage has.

mod backend;
mod local;
pub mod transfer;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewSnippet, Settings, SettingsPatch, Snippet};

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use local::{LocalSettingsStore, LocalSnippetStore, SETTINGS_KEY, SNIPPETS_KEY};
pub use transfer::{ExportDocument, ImportOptions, ImportReport, EXPORT_VERSION};

/// Errors raised by storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The runtime link to storage is gone (e.g. the extension was reloaded)
    #[error("extension context invalidated - cannot access storage")]
    ContextInvalidated,

    /// Update of a snippet id that is not stored
    #[error("snippet not found: {id}")]
    NotFound { id: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Data(#[from] serde_json::Error),
}

/// Async CRUD access to the snippet collection
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// All snippets, in storage order
    async fn get_all(&self) -> Result<Vec<Snippet>, StorageError>;

    /// Store a new snippet under a freshly generated id
    async fn add(&self, snippet: NewSnippet) -> Result<Snippet, StorageError>;

    /// Replace the snippet with the same id; fails if the id is unknown
    async fn update(&self, snippet: Snippet) -> Result<Snippet, StorageError>;

    /// Remove a snippet; unknown ids are ignored
    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Overwrite the whole collection
    async fn replace_all(&self, snippets: Vec<Snippet>) -> Result<(), StorageError>;

    /// Serialize every snippet into the export format
    async fn export_all(&self) -> Result<String, StorageError> {
        let snippets = self.get_all().await?;
        Ok(transfer::export_document(&snippets)?)
    }

    /// Import an export document
    ///
    /// Problems with the document or individual records are reported in the
    /// returned [`ImportReport`]; only failures to read or write the store
    /// are returned as errors.
    async fn import_all(
        &self,
        data: &str,
        options: ImportOptions,
    ) -> Result<ImportReport, StorageError> {
        let existing = self.get_all().await?;
        let plan = transfer::plan_import(data, &existing, options, transfer::new_id);
        if plan.report.success {
            self.replace_all(plan.snippets).await?;
            tracing::info!(
                imported = plan.report.imported_count,
                skipped = plan.report.skipped_count,
                rejected = plan.report.errors.len(),
                merge = options.merge,
                "imported snippets"
            );
        }
        Ok(plan.report)
    }
}

/// Async access to user settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or the defaults when none were saved
    async fn get_settings(&self) -> Result<Settings, StorageError>;

    /// Merge a partial update into the stored settings
    async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, StorageError>;
}
