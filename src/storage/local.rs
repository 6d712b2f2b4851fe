//! Snippet and settings stores over a key-value backend

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{NewSnippet, Settings, SettingsPatch, Snippet};

use super::backend::KeyValueBackend;
use super::transfer::new_id;
use super::{SettingsStore, SnippetStore, StorageError};

/// Key under which the snippet list is stored
pub const SNIPPETS_KEY: &str = "snippets";

/// Key under which the settings object is stored
pub const SETTINGS_KEY: &str = "settings";

/// Snippet store keeping the whole list under [`SNIPPETS_KEY`]
#[derive(Debug)]
pub struct LocalSnippetStore<B> {
    backend: Arc<B>,
}

impl<B> Clone for LocalSnippetStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: KeyValueBackend> LocalSnippetStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn ensure_alive(&self) -> Result<(), StorageError> {
        if self.backend.is_alive() {
            Ok(())
        } else {
            warn!("extension context invalidated - cannot access storage");
            Err(StorageError::ContextInvalidated)
        }
    }

    async fn read(&self) -> Result<Vec<Snippet>, StorageError> {
        self.ensure_alive()?;
        match self.backend.get(SNIPPETS_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, snippets: &[Snippet]) -> Result<(), StorageError> {
        self.ensure_alive()?;
        self.backend
            .set(SNIPPETS_KEY, serde_json::to_value(snippets)?)
            .await
    }
}

#[async_trait]
impl<B: KeyValueBackend> SnippetStore for LocalSnippetStore<B> {
    async fn get_all(&self) -> Result<Vec<Snippet>, StorageError> {
        self.read().await.inspect_err(|e| {
            warn!(error = %e, "failed to read snippets");
        })
    }

    async fn add(&self, snippet: NewSnippet) -> Result<Snippet, StorageError> {
        let mut snippets = self.read().await?;
        let snippet = snippet.with_id(new_id());
        snippets.push(snippet.clone());
        self.write(&snippets).await?;
        debug!(id = %snippet.id, "added snippet");
        Ok(snippet)
    }

    async fn update(&self, snippet: Snippet) -> Result<Snippet, StorageError> {
        let mut snippets = self.read().await?;
        let slot = snippets
            .iter_mut()
            .find(|s| s.id == snippet.id)
            .ok_or_else(|| StorageError::NotFound {
                id: snippet.id.clone(),
            })?;
        *slot = snippet.clone();
        self.write(&snippets).await?;
        debug!(id = %snippet.id, "updated snippet");
        Ok(snippet)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut snippets = self.read().await?;
        let before = snippets.len();
        snippets.retain(|s| s.id != id);
        if snippets.len() != before {
            debug!(id, "deleted snippet");
        }
        self.write(&snippets).await
    }

    async fn replace_all(&self, snippets: Vec<Snippet>) -> Result<(), StorageError> {
        self.write(&snippets).await
    }
}

/// Settings store keeping one object under [`SETTINGS_KEY`]
#[derive(Debug)]
pub struct LocalSettingsStore<B> {
    backend: Arc<B>,
}

impl<B> Clone for LocalSettingsStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: KeyValueBackend> LocalSettingsStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: KeyValueBackend> SettingsStore for LocalSettingsStore<B> {
    async fn get_settings(&self) -> Result<Settings, StorageError> {
        if !self.backend.is_alive() {
            return Err(StorageError::ContextInvalidated);
        }
        match self.backend.get(SETTINGS_KEY).await? {
            Some(Value::Null) | None => Ok(Settings::default()),
            Some(value) => match serde_json::from_value(value) {
                Ok(settings) => Ok(settings),
                Err(err) => {
                    warn!(error = %err, "unreadable settings, using defaults");
                    Ok(Settings::default())
                }
            },
        }
    }

    async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, StorageError> {
        let merged = self.get_settings().await?.merged(patch);
        self.backend
            .set(SETTINGS_KEY, serde_json::to_value(&merged)?)
            .await?;
        Ok(merged)
    }
}
