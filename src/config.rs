//! User configuration loaded from TOML
//!
//! ```toml
//! [store]
//! path = "~/snippets.json"
//!
//! [search]
//! threshold = 0.4
//!
//! [search.weights]
//! title = 1.0
//! body = 0.6
//!
//! [palette]
//! preview_length = 80
//! ```
//!
//! Every section and key is optional.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::palette::DEFAULT_PREVIEW_LENGTH;
use crate::search::{SearchConfig, SearchField};

/// Directory under the platform config/data dirs
const APP_DIR: &str = "promply";

/// Errors that can occur when loading or parsing the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown search field '{0}' (expected title, body, tags or folder)")]
    UnknownSearchField(String),
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON file backing the snippet and settings store
    pub store_path: PathBuf,
    pub search: SearchConfig,
    pub preview_length: usize,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    store: TomlStore,
    #[serde(default)]
    search: TomlSearch,
    #[serde(default)]
    palette: TomlPalette,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlStore {
    path: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlSearch {
    threshold: Option<f64>,
    #[serde(default)]
    weights: BTreeMap<String, f64>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlPalette {
    preview_length: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            search: SearchConfig::default(),
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Config::default();

        if let Some(path) = parsed.store.path {
            config.store_path = expand_home(path);
        }
        if let Some(threshold) = parsed.search.threshold {
            config.search = config.search.with_threshold(threshold);
        }
        for (name, weight) in parsed.search.weights {
            let field: SearchField = name.parse().map_err(ConfigError::UnknownSearchField)?;
            config.search = config.search.with_key_weight(field, weight);
        }
        if let Some(preview_length) = parsed.palette.preview_length {
            config.preview_length = preview_length;
        }
        Ok(config)
    }

    /// Load `path`, or the default location when `None`
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    debug!(path = %path.display(), "loading config");
                    Self::from_file(&path)
                }
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/promply/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("store.json")
}

fn expand_home(path: PathBuf) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path,
    }
}
