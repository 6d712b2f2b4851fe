//! End-to-end palette flows against the headless host

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use promply::collect::{SurfaceHandle, VariableSurface};
use promply::host::memory::{ExecMode, MemoryHost};
use promply::host::{DomEvent, EditCommand, EditableElement, Notice};
use promply::keys::{KeyEvent, ENTER, ESCAPE, TAB};
use promply::palette::{KeyDisposition, PaletteState};
use promply::storage::{LocalSettingsStore, LocalSnippetStore, MemoryBackend, SettingsStore, SnippetStore};
use promply::{
    AppContext, NewSnippet, PaletteController, SearchConfig, SettingsPatch, VariableDeclaration,
    VariableForm,
};

/// Records what a host would have drawn
#[derive(Clone, Default)]
struct RecordingSurface {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingSurface {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl VariableSurface for RecordingSurface {
    fn mount(&self, form: &VariableForm) -> SurfaceHandle {
        let labels: Vec<_> = form.fields().iter().map(|f| f.label().to_string()).collect();
        self.log
            .lock()
            .unwrap()
            .push(format!("mount {}: {}", form.title(), labels.join(", ")));
        let log = Arc::clone(&self.log);
        SurfaceHandle::new(move || log.lock().unwrap().push("dispose".to_string()))
    }
}

async fn palette(
    snippets: Vec<NewSnippet>,
) -> (PaletteController<MemoryHost>, MemoryHost, Arc<MemoryBackend>, RecordingSurface) {
    let backend = Arc::new(MemoryBackend::new());
    let store = LocalSnippetStore::new(Arc::clone(&backend));
    for snippet in snippets {
        store.add(snippet).await.unwrap();
    }
    let ctx = AppContext::new(
        Arc::new(store),
        Arc::new(LocalSettingsStore::new(Arc::clone(&backend))),
    )
    .with_search(SearchConfig::default());
    let host = MemoryHost::new();
    let surface = RecordingSurface::default();
    let palette = PaletteController::new(host.clone(), ctx).with_surface(surface.clone());
    (palette, host, backend, surface)
}

fn email() -> NewSnippet {
    NewSnippet::new("Email reply", "Dear {{recipient}},\n\n{{message}}\n\nBest,\n{{sender}}")
        .with_folder("Work")
        .with_tags(["email"])
        .with_variable(VariableDeclaration::new("recipient").with_description("Recipient"))
        .with_variable(VariableDeclaration::new("sender").with_default("Sam"))
}

#[tokio::test]
async fn test_custom_activator_after_refresh() {
    let (mut palette, host, _backend, _) = palette(vec![NewSnippet::new("Hi", "Hello!")]).await;
    palette
        .context()
        .settings_store()
        .update_settings(SettingsPatch {
            activator_key: Some("ctrl+space".to_string()),
        })
        .await
        .unwrap();
    let input = host.input();

    // Still the default until refreshed
    let space = KeyEvent::new(" ").with_ctrl();
    assert_eq!(
        palette.on_key_down(&space, Some(&input)).await,
        KeyDisposition::Ignored
    );

    palette.context_mut().refresh_settings().await;
    assert_eq!(
        palette.on_key_down(&KeyEvent::new("/"), Some(&input)).await,
        KeyDisposition::Ignored
    );
    assert_eq!(
        palette.on_key_down(&space, Some(&input)).await,
        KeyDisposition::Consumed
    );
    assert_eq!(palette.state(), PaletteState::Searching);
}

#[tokio::test]
async fn test_full_flow_into_content_editable() {
    let (mut palette, host, _backend, surface) =
        palette(vec![NewSnippet::new("Hi", "Hello!"), email()]).await;
    let editor = host.content_editable();
    editor.set_text_content("draft");

    palette.on_key_down(&KeyEvent::new("/"), Some(&editor)).await;
    palette.set_query("email");
    let view = palette.view().unwrap();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].folder.as_deref(), Some("Work"));
    assert!(view.entries[0].has_variables);

    palette.on_key_down(&KeyEvent::new(ENTER), None).await;
    assert_eq!(palette.state(), PaletteState::AwaitingVariables);
    assert_eq!(
        surface.log(),
        vec!["mount Email reply: Recipient, message, sender"]
    );

    // Typing goes to the focused field; Tab moves on
    let form = palette.variable_form_mut().unwrap();
    form.set_focused_value("Alex");
    assert_eq!(
        palette.on_key_down(&KeyEvent::new(TAB), None).await,
        KeyDisposition::Consumed
    );
    palette
        .variable_form_mut()
        .unwrap()
        .set_focused_value("Thanks for the update.");
    assert_eq!(
        palette
            .on_key_down(&KeyEvent::new(ENTER).with_shift(), None)
            .await,
        KeyDisposition::Ignored
    );
    assert_eq!(
        palette.on_key_down(&KeyEvent::new(ENTER), None).await,
        KeyDisposition::Consumed
    );

    assert_eq!(
        editor.text_content(),
        "Dear Alex,\n\nThanks for the update.\n\nBest,\nSam"
    );
    assert_eq!(host.commands()[0], EditCommand::SelectAll);
    assert_eq!(surface.log().last().map(String::as_str), Some("dispose"));
    assert_eq!(palette.state(), PaletteState::Closed);
    assert!(palette.target().is_none());
}

#[tokio::test]
async fn test_content_editable_without_edit_commands() {
    let (mut palette, host, _backend, _) = palette(vec![NewSnippet::new("Hi", "Hello!")]).await;
    host.set_exec_mode(ExecMode::Unavailable);
    let editor = host.content_editable();

    palette.on_key_down(&KeyEvent::new("/"), Some(&editor)).await;
    palette.on_key_down(&KeyEvent::new(ENTER), None).await;

    assert_eq!(editor.text_content(), "Hello!");
    assert_eq!(editor.events().len(), 1);
    assert_eq!(editor.events()[0].event, DomEvent::Input);
    assert!(editor.events()[0].bubbles);
}

#[tokio::test]
async fn test_shadowed_textarea_receives_snippet() {
    let (mut palette, host, _backend, _) = palette(vec![NewSnippet::new("Hi", "Hello!")]).await;
    let textarea = host.textarea();
    textarea.shadow_value_property();

    palette.on_key_down(&KeyEvent::new("/"), Some(&textarea)).await;
    palette.on_key_down(&KeyEvent::new(ENTER), None).await;

    assert_eq!(textarea.value(), "Hello!");
    let events: Vec<_> = textarea.events().iter().map(|e| e.event.name()).collect();
    assert_eq!(events, vec!["input", "change", "keyup"]);
}

#[tokio::test]
async fn test_escape_in_form_keeps_page_untouched() {
    let (mut palette, host, _backend, surface) = palette(vec![email()]).await;
    let input = host.input();
    input.write_raw_value("existing");

    palette.on_key_down(&KeyEvent::new("/"), Some(&input)).await;
    palette.on_key_down(&KeyEvent::new(ENTER), None).await;
    palette.on_key_down(&KeyEvent::new(ESCAPE), None).await;

    assert_eq!(input.value(), "existing");
    assert!(host.clipboard().is_empty());
    assert_eq!(surface.log().len(), 2);
    assert_eq!(palette.state(), PaletteState::Closed);

    // The palette can be opened again afterwards
    assert_eq!(
        palette.on_key_down(&KeyEvent::new("/"), Some(&input)).await,
        KeyDisposition::Consumed
    );
}

#[tokio::test]
async fn test_storage_lost_mid_session() {
    let (mut palette, host, backend, _) = palette(vec![NewSnippet::new("Hi", "Hello!")]).await;
    let input = host.input();

    palette.on_key_down(&KeyEvent::new("/"), Some(&input)).await;
    palette.on_key_down(&KeyEvent::new(ESCAPE), None).await;
    backend.invalidate();

    palette.on_key_down(&KeyEvent::new("/"), Some(&input)).await;
    assert_eq!(palette.state(), PaletteState::Closed);
    let notices = host.notices();
    assert_eq!(notices.len(), 1);
    insta::assert_snapshot!(
        notices[0].message(),
        @"Failed to load snippets. Extension may need to be reloaded."
    );
    assert_eq!(notices[0], Notice::Error(notices[0].message().to_string()));
}
