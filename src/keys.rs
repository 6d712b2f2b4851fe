//! Keyboard events and the configurable activation chord

use std::fmt;

use thiserror::Error;

use crate::model::DEFAULT_ACTIVATOR_KEY;

pub const ESCAPE: &str = "Escape";
pub const ENTER: &str = "Enter";
pub const TAB: &str = "Tab";
pub const ARROW_UP: &str = "ArrowUp";
pub const ARROW_DOWN: &str = "ArrowDown";

/// A keydown as reported by the host, using DOM `key` names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Whether this is the named key, ignoring modifiers
    pub fn is(&self, key: &str) -> bool {
        self.key == key
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyChordError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown modifier '{0}' (expected ctrl, alt, shift or meta)")]
    UnknownModifier(String),
}

/// A key plus required modifiers, parsed from settings like `/` or `ctrl+space`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    key: String,
    ctrl: bool,
    alt: bool,
    shift: bool,
    meta: bool,
}

impl KeyChord {
    /// Parse a chord description
    ///
    /// Modifiers are joined with `+` and are case-insensitive: `ctrl`/`control`,
    /// `alt`/`option`, `shift`, `meta`/`cmd`/`command`/`super`. The final part
    /// is the key; `space`, `esc`, `return` are accepted as aliases. A lone
    /// `+` (or a trailing `++`) names the plus key.
    pub fn parse(text: &str) -> Result<Self, KeyChordError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KeyChordError::Empty);
        }

        let (modifiers, key) = if text == "+" {
            ("", "+")
        } else if let Some(prefix) = text.strip_suffix("++") {
            (prefix, "+")
        } else {
            match text.rsplit_once('+') {
                Some((modifiers, key)) if !key.is_empty() => (modifiers, key),
                Some(_) => return Err(KeyChordError::Empty),
                None => ("", text),
            }
        };

        let mut chord = KeyChord::plain(key);
        for modifier in modifiers.split('+').map(str::trim).filter(|m| !m.is_empty()) {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                "meta" | "cmd" | "command" | "super" => chord.meta = true,
                _ => return Err(KeyChordError::UnknownModifier(modifier.to_string())),
            }
        }
        Ok(chord)
    }

    /// A single key with no modifiers
    pub fn plain(key: &str) -> Self {
        KeyChord {
            key: normalize_key(key),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a keydown triggers this chord
    ///
    /// Ctrl, Alt and Meta must match exactly. Shift must match too, except for
    /// a bare single-character key: on many layouts `/` or `?` needs Shift, and
    /// the reported `key` already reflects it. That same key is compared
    /// exactly, so a bare `p` does not fire on `P`. With modifiers held the
    /// character is compared case-insensitively.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if event.ctrl != self.ctrl || event.alt != self.alt || event.meta != self.meta {
            return false;
        }
        let single_char = self.key.chars().count() == 1;
        let bare = !(self.ctrl || self.alt || self.meta || self.shift);
        if !(single_char && bare) && event.shift != self.shift {
            return false;
        }
        if single_char && bare {
            event.key == self.key
        } else if single_char {
            event.key.to_lowercase() == self.key.to_lowercase()
        } else {
            event.key.eq_ignore_ascii_case(&self.key)
        }
    }
}

impl Default for KeyChord {
    fn default() -> Self {
        KeyChord::plain(DEFAULT_ACTIVATOR_KEY)
    }
}

fn normalize_key(key: &str) -> String {
    let key = if key.chars().count() == 1 { key } else { key.trim() };
    match key.to_ascii_lowercase().as_str() {
        "space" | "spacebar" => " ".to_string(),
        "esc" | "escape" => ESCAPE.to_string(),
        "enter" | "return" => ENTER.to_string(),
        "tab" => TAB.to_string(),
        "up" | "arrowup" => ARROW_UP.to_string(),
        "down" | "arrowdown" => ARROW_DOWN.to_string(),
        _ => key.to_string(),
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        let key = if self.key == " " { "Space" } else { self.key.as_str() };
        parts.push(key);
        write!(f, "{}", parts.join("+"))
    }
}
