//! Template engine for snippet bodies
//!
//! Bodies are plain text with `{{name}}` placeholders, where `name` follows
//! the identifier grammar `[A-Za-z_][A-Za-z0-9_]*`. Anything else that looks
//! like a placeholder (`{{ name }}`, `{{1st}}`, a single `{`) is literal text.
//!
//! # Example
//!
//! ```rust
//! use promply::template::{extract_variable_names, substitute};
//! use promply::VariableValues;
//!
//! let body = "Hi {{name}}, you are {{age}}";
//! assert_eq!(extract_variable_names(body), vec!["name", "age"]);
//!
//! let mut values = VariableValues::new();
//! values.insert("name".to_string(), "Sam".to_string());
//! values.insert("age".to_string(), "9".to_string());
//! assert_eq!(substitute(body, &values), "Hi Sam, you are 9");
//! ```

pub mod ast;
mod engine;
mod grammar;
pub mod lexer;

pub use ast::{Segment, Spanned, Template};
pub use engine::{
    extract_variable_names, has_variables, resolve_variables, substitute, validate, Validation,
};
pub use grammar::parse;
