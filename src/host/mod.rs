//! Boundary with the page the snippets are inserted into
//!
//! The core only needs a handful of capabilities from the host document:
//! classify an element, write into it, raise the events a page listens to,
//! run a document editing command, reach the clipboard and show a transient
//! notice. A browser build implements these over the real DOM; [`memory`]
//! implements them headlessly.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// What kind of text sink an element is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Native `<input>` (single line) or `<textarea>` (multi-line)
    TextField { multiline: bool },
    /// Element with its contentEditable flag set
    RichText,
    /// Anything else; never written to
    Unsupported,
}

impl Capability {
    pub fn is_editable(&self) -> bool {
        !matches!(self, Capability::Unsupported)
    }
}

/// Synthetic events raised on the target after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
    KeyUp,
}

impl DomEvent {
    /// DOM event type name
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::KeyUp => "keyup",
        }
    }
}

/// Document-level editing commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    SelectAll,
    InsertText(String),
}

/// Errors reported by the host
#[derive(Debug, Error)]
pub enum HostError {
    /// The editing command API does not exist in this document
    #[error("editing command unavailable")]
    Unavailable,

    #[error("editing command failed: {0}")]
    CommandFailed(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),
}

/// A reference to one node in the host document
///
/// Handles are cheap to clone and all clones refer to the same node, like
/// DOM references do. Methods take `&self` for the same reason.
pub trait EditableElement: Clone + Send + Sync {
    fn capability(&self) -> Capability;

    /// Set the value through the primitive element class's setter
    ///
    /// Pages often install a `value` override on the instance and ignore
    /// plain assignment; this path writes underneath any such override.
    fn write_raw_value(&self, text: &str);

    /// Overwrite the node's text content
    fn set_text_content(&self, text: &str);

    fn focus(&self);

    fn dispatch(&self, event: DomEvent, bubbles: bool);

    /// Whether a keypress inside this element may open the palette
    fn is_editable(&self) -> bool {
        self.capability().is_editable()
    }
}

/// The host document and its surroundings
#[async_trait]
pub trait Host: Send + Sync {
    type Element: EditableElement;

    /// Liveness check for the extension runtime link
    fn runtime_alive(&self) -> bool;

    /// Run an editing command against the focused element
    fn exec_command(&self, command: &EditCommand) -> Result<(), HostError>;

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError>;

    /// Show a transient, non-blocking notice on the page
    fn notify(&self, notice: Notice);
}

/// User-visible transient messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The runtime link is gone; the page has to be refreshed
    ExtensionReloaded,
    /// Text went to the clipboard instead of the page
    CopiedToClipboard,
    Error(String),
}

impl Notice {
    pub fn title(&self) -> &str {
        match self {
            Notice::ExtensionReloaded => "Extension Reloaded",
            Notice::CopiedToClipboard => "Copied",
            Notice::Error(_) => "Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::ExtensionReloaded => "Please refresh this page to use Promply",
            Notice::CopiedToClipboard => "Snippet copied to clipboard",
            Notice::Error(message) => message,
        }
    }

    /// Delay after which the notice removes itself
    pub fn dismiss_after(&self) -> Duration {
        match self {
            Notice::ExtensionReloaded => Duration::from_secs(5),
            Notice::CopiedToClipboard | Notice::Error(_) => Duration::from_secs(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_editable() {
        assert!(Capability::TextField { multiline: false }.is_editable());
        assert!(Capability::TextField { multiline: true }.is_editable());
        assert!(Capability::RichText.is_editable());
        assert!(!Capability::Unsupported.is_editable());
    }

    #[test]
    fn test_notice_durations() {
        assert_eq!(Notice::ExtensionReloaded.dismiss_after(), Duration::from_secs(5));
        assert_eq!(
            Notice::Error("x".to_string()).dismiss_after(),
            Duration::from_secs(4)
        );
        assert_eq!(Notice::Error("boom".to_string()).message(), "boom");
    }
}
