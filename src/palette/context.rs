//! Collaborators and settings handed to the palette at startup

use std::sync::Arc;

use tracing::{debug, warn};

use crate::keys::KeyChord;
use crate::model::Settings;
use crate::search::SearchConfig;
use crate::storage::{SettingsStore, SnippetStore};

use super::view::DEFAULT_PREVIEW_LENGTH;

/// Application context owned by a [`PaletteController`](super::PaletteController)
///
/// Settings are loaded explicitly through [`AppContext::refresh_settings`];
/// until then the defaults apply.
#[derive(Clone)]
pub struct AppContext {
    snippets: Arc<dyn SnippetStore>,
    settings_store: Arc<dyn SettingsStore>,
    settings: Settings,
    activator: KeyChord,
    search: SearchConfig,
    preview_length: usize,
}

impl AppContext {
    pub fn new(snippets: Arc<dyn SnippetStore>, settings_store: Arc<dyn SettingsStore>) -> Self {
        Self {
            snippets,
            settings_store,
            settings: Settings::default(),
            activator: KeyChord::default(),
            search: SearchConfig::default(),
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }

    pub fn snippets(&self) -> &Arc<dyn SnippetStore> {
        &self.snippets
    }

    pub fn settings_store(&self) -> &Arc<dyn SettingsStore> {
        &self.settings_store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn activator(&self) -> &KeyChord {
        &self.activator
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    pub fn preview_length(&self) -> usize {
        self.preview_length
    }

    /// Reload settings from the store
    ///
    /// A failed read or an unparseable activator keeps the default key.
    pub async fn refresh_settings(&mut self) -> &Settings {
        let settings = match self.settings_store.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "failed to load settings, using defaults");
                Settings::default()
            }
        };
        self.activator = match KeyChord::parse(&settings.activator_key) {
            Ok(chord) => chord,
            Err(e) => {
                warn!(key = %settings.activator_key, error = %e, "invalid activator key, using default");
                KeyChord::default()
            }
        };
        debug!(activator = %self.activator, "settings refreshed");
        self.settings = settings;
        &self.settings
    }
}
