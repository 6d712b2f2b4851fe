//! Writing final snippet text into the captured target element

use thiserror::Error;
use tracing::{debug, warn};

use crate::host::{Capability, DomEvent, EditCommand, EditableElement, Host, HostError, Notice};

/// Message shown when neither insertion nor the clipboard worked
pub const PASTE_FAILED_MESSAGE: &str = "Failed to paste snippet";

/// How the text reached the element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Primitive value setter on a native field
    RawValue,
    /// Select-all + insert-text editing commands on a rich-text region
    EditCommand,
    /// Direct text content overwrite after the editing commands failed
    TextContent,
}

/// Why the text went to the clipboard instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The target reference was lost
    NoTarget,
    /// The target cannot receive text
    Unsupported,
}

/// Result of an injection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Inserted(Strategy),
    /// Copied, not inserted; callers should say so to the user
    CopiedToClipboard(FallbackReason),
}

#[derive(Debug, Error)]
pub enum InjectError {
    /// Insertion was impossible and the clipboard fallback failed too
    #[error("Failed to paste snippet: {0}")]
    Clipboard(#[source] HostError),
}

/// Write `text` into `target`, picking a strategy from its capability
///
/// Native fields get a raw value write followed by bubbling `input`,
/// `change` and `keyup` events, in that order. Rich-text regions go through
/// the editing commands first and fall back to a text content overwrite with
/// a bubbling `input` event. A missing or unsupported target falls back to
/// the clipboard.
pub async fn inject<H: Host>(
    host: &H,
    target: Option<&H::Element>,
    text: &str,
) -> Result<InjectOutcome, InjectError> {
    let Some(target) = target else {
        warn!("no target element to paste into");
        return copy_to_clipboard(host, text, FallbackReason::NoTarget).await;
    };

    match target.capability() {
        Capability::TextField { .. } => {
            write_text_field(target, text);
            Ok(InjectOutcome::Inserted(Strategy::RawValue))
        }
        Capability::RichText => Ok(InjectOutcome::Inserted(write_rich_text(host, target, text))),
        Capability::Unsupported => {
            warn!("element is not suitable for pasting");
            copy_to_clipboard(host, text, FallbackReason::Unsupported).await
        }
    }
}

fn write_text_field<E: EditableElement>(target: &E, text: &str) {
    target.write_raw_value(text);
    target.focus();
    for event in [DomEvent::Input, DomEvent::Change, DomEvent::KeyUp] {
        target.dispatch(event, true);
    }
}

fn write_rich_text<H: Host>(host: &H, target: &H::Element, text: &str) -> Strategy {
    target.focus();

    let commands = host
        .exec_command(&EditCommand::SelectAll)
        .and_then(|()| host.exec_command(&EditCommand::InsertText(text.to_string())));
    match commands {
        Ok(()) => Strategy::EditCommand,
        Err(e) => {
            debug!(error = %e, "editing commands failed, overwriting text content");
            target.set_text_content(text);
            target.dispatch(DomEvent::Input, true);
            Strategy::TextContent
        }
    }
}

async fn copy_to_clipboard<H: Host>(
    host: &H,
    text: &str,
    reason: FallbackReason,
) -> Result<InjectOutcome, InjectError> {
    match host.write_clipboard(text).await {
        Ok(()) => {
            host.notify(Notice::CopiedToClipboard);
            Ok(InjectOutcome::CopiedToClipboard(reason))
        }
        Err(e) => {
            host.notify(Notice::Error(PASTE_FAILED_MESSAGE.to_string()));
            Err(InjectError::Clipboard(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{ExecMode, MemoryHost, RecordedEvent};
    use pretty_assertions::assert_eq;

    fn bubbling(events: &[DomEvent]) -> Vec<RecordedEvent> {
        events
            .iter()
            .map(|&event| RecordedEvent {
                event,
                bubbles: true,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_input_gets_value_and_events_in_order() {
        let host = MemoryHost::new();
        let input = host.input();

        let outcome = inject(&host, Some(&input), "hello").await.unwrap();

        assert_eq!(outcome, InjectOutcome::Inserted(Strategy::RawValue));
        assert_eq!(input.value(), "hello");
        assert!(input.is_focused());
        assert_eq!(
            input.events(),
            bubbling(&[DomEvent::Input, DomEvent::Change, DomEvent::KeyUp])
        );
    }

    #[tokio::test]
    async fn test_shadowed_textarea_still_receives_value() {
        let host = MemoryHost::new();
        let textarea = host.textarea();
        textarea.shadow_value_property();

        inject(&host, Some(&textarea), "line one\nline two")
            .await
            .unwrap();
        assert_eq!(textarea.value(), "line one\nline two");
    }

    #[tokio::test]
    async fn test_content_editable_uses_editing_commands() {
        let host = MemoryHost::new();
        let editor = host.content_editable();
        editor.set_text_content("draft");

        let outcome = inject(&host, Some(&editor), "final").await.unwrap();

        assert_eq!(outcome, InjectOutcome::Inserted(Strategy::EditCommand));
        assert_eq!(editor.text_content(), "final");
        assert_eq!(
            host.commands(),
            vec![
                EditCommand::SelectAll,
                EditCommand::InsertText("final".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_content_editable_falls_back_when_commands_fail() {
        for mode in [ExecMode::Unavailable, ExecMode::Failing] {
            let host = MemoryHost::new();
            host.set_exec_mode(mode);
            let editor = host.content_editable();

            let outcome = inject(&host, Some(&editor), "final").await.unwrap();

            assert_eq!(outcome, InjectOutcome::Inserted(Strategy::TextContent));
            assert_eq!(editor.text_content(), "final");
            assert_eq!(editor.events(), bubbling(&[DomEvent::Input]));
            assert!(host.notices().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_target_copies_to_clipboard() {
        let host = MemoryHost::new();

        let outcome = inject::<MemoryHost>(&host, None, "text").await.unwrap();

        assert_eq!(
            outcome,
            InjectOutcome::CopiedToClipboard(FallbackReason::NoTarget)
        );
        assert_eq!(host.clipboard(), vec!["text"]);
        assert_eq!(host.notices(), vec![Notice::CopiedToClipboard]);
    }

    #[tokio::test]
    async fn test_unsupported_target_copies_to_clipboard() {
        let host = MemoryHost::new();
        let div = host.div();

        let outcome = inject(&host, Some(&div), "text").await.unwrap();

        assert_eq!(
            outcome,
            InjectOutcome::CopiedToClipboard(FallbackReason::Unsupported)
        );
        assert!(div.events().is_empty());
        assert_eq!(host.clipboard(), vec!["text"]);
    }

    #[tokio::test]
    async fn test_clipboard_failure_is_reported() {
        let host = MemoryHost::new();
        host.fail_clipboard();

        let result = inject::<MemoryHost>(&host, None, "text").await;

        assert!(matches!(result, Err(InjectError::Clipboard(_))));
        assert_eq!(
            host.notices(),
            vec![Notice::Error(PASTE_FAILED_MESSAGE.to_string())]
        );
    }
}
