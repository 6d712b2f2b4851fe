//! Promply - prompt snippets with `{{variables}}`, inserted anywhere you type
//!
//! This library provides the template engine, storage, fuzzy search,
//! variable collection, text injection and the command palette state machine
//! behind the Promply extension. The page the text ends up in is reached
//! through the [`host`] traits, so the core runs the same against a browser
//! document or the bundled headless one.
//!
//! # Example
//!
//! ```rust
//! use promply::{NewSnippet, VariableDeclaration, VariableValues};
//!
//! let snippet = NewSnippet::new("Greeting", "Hi {{name}}, you are {{age}}")
//!     .with_variable(VariableDeclaration::new("name").with_default("Alex"))
//!     .with_id("greeting");
//!
//! let vars = snippet.resolved_variables();
//! assert_eq!(vars[0].default_value.as_deref(), Some("Alex"));
//! assert_eq!(vars[1].name, "age");
//!
//! let mut values = VariableValues::new();
//! values.insert("name".to_string(), "Sam".to_string());
//! values.insert("age".to_string(), "9".to_string());
//! assert_eq!(snippet.render(&values), "Hi Sam, you are 9");
//! ```

pub mod collect;
pub mod config;
pub mod error;
pub mod host;
pub mod inject;
pub mod keys;
pub mod model;
pub mod palette;
pub mod search;
pub mod storage;
pub mod template;

pub use collect::{CollectError, VariableForm};
pub use config::{Config, ConfigError};
pub use error::ParseError;
pub use inject::{inject, InjectError, InjectOutcome};
pub use model::{
    NewSnippet, ResolvedVariable, Settings, SettingsPatch, Snippet, VariableDeclaration,
    VariableValues,
};
pub use palette::{AppContext, PaletteController, PaletteError};
pub use search::{FuzzyIndex, SearchConfig};
pub use storage::{SettingsStore, SnippetStore, StorageError};
