//! Headless host document
//!
//! Records every write, event, editing command, clipboard write and notice so
//! the palette flow can be driven and inspected without a browser. It can
//! also play the part of a hostile or broken page: an instance-level `value`
//! override, a missing or throwing editing command API, a dead runtime link,
//! a clipboard that refuses writes.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Capability, DomEvent, EditCommand, EditableElement, Host, HostError, Notice};

/// How the document's editing command API behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Supported,
    /// The API does not exist
    Unavailable,
    /// The API exists but throws
    Failing,
}

/// An event raised on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    pub event: DomEvent,
    pub bubbles: bool,
}

#[derive(Debug)]
struct ElementState {
    capability: Capability,
    value: String,
    text_content: String,
    /// Page installed a `value` override on the instance
    value_shadowed: bool,
    events: Vec<RecordedEvent>,
}

#[derive(Debug)]
struct Document {
    elements: Vec<ElementState>,
    focused: Option<usize>,
    select_all: bool,
    alive: bool,
    exec_mode: ExecMode,
    clipboard_fails: bool,
    clipboard: Vec<String>,
    commands: Vec<EditCommand>,
    notices: Vec<Notice>,
}

fn lock(doc: &Mutex<Document>) -> MutexGuard<'_, Document> {
    // A panic while holding the lock only happens inside a failing test
    match doc.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Headless [`Host`] implementation
#[derive(Debug, Clone)]
pub struct MemoryHost {
    doc: Arc<Mutex<Document>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            doc: Arc::new(Mutex::new(Document {
                elements: Vec::new(),
                focused: None,
                select_all: false,
                alive: true,
                exec_mode: ExecMode::default(),
                clipboard_fails: false,
                clipboard: Vec::new(),
                commands: Vec::new(),
                notices: Vec::new(),
            })),
        }
    }

    fn create(&self, capability: Capability) -> MemoryElement {
        let mut doc = lock(&self.doc);
        doc.elements.push(ElementState {
            capability,
            value: String::new(),
            text_content: String::new(),
            value_shadowed: false,
            events: Vec::new(),
        });
        MemoryElement {
            doc: Arc::clone(&self.doc),
            id: doc.elements.len() - 1,
        }
    }

    /// A single-line `<input>`
    pub fn input(&self) -> MemoryElement {
        self.create(Capability::TextField { multiline: false })
    }

    /// A `<textarea>`
    pub fn textarea(&self) -> MemoryElement {
        self.create(Capability::TextField { multiline: true })
    }

    /// A contentEditable region
    pub fn content_editable(&self) -> MemoryElement {
        self.create(Capability::RichText)
    }

    /// A plain, non-editable `<div>`
    pub fn div(&self) -> MemoryElement {
        self.create(Capability::Unsupported)
    }

    /// Simulate the extension being reloaded under the page
    pub fn invalidate_runtime(&self) {
        lock(&self.doc).alive = false;
    }

    pub fn set_exec_mode(&self, mode: ExecMode) {
        lock(&self.doc).exec_mode = mode;
    }

    pub fn fail_clipboard(&self) {
        lock(&self.doc).clipboard_fails = true;
    }

    pub fn clipboard(&self) -> Vec<String> {
        lock(&self.doc).clipboard.clone()
    }

    pub fn commands(&self) -> Vec<EditCommand> {
        lock(&self.doc).commands.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.doc).notices.clone()
    }
}

#[async_trait]
impl Host for MemoryHost {
    type Element = MemoryElement;

    fn runtime_alive(&self) -> bool {
        lock(&self.doc).alive
    }

    fn exec_command(&self, command: &EditCommand) -> Result<(), HostError> {
        let mut doc = lock(&self.doc);
        match doc.exec_mode {
            ExecMode::Supported => {}
            ExecMode::Unavailable => return Err(HostError::Unavailable),
            ExecMode::Failing => {
                return Err(HostError::CommandFailed("execCommand threw".to_string()))
            }
        }
        doc.commands.push(command.clone());

        let Some(id) = doc.focused else {
            return Ok(());
        };
        match command {
            EditCommand::SelectAll => doc.select_all = true,
            EditCommand::InsertText(text) => {
                let replace = std::mem::take(&mut doc.select_all);
                let el = &mut doc.elements[id];
                if replace {
                    el.text_content = text.clone();
                } else {
                    el.text_content.push_str(text);
                }
                el.events.push(RecordedEvent {
                    event: DomEvent::Input,
                    bubbles: true,
                });
            }
        }
        Ok(())
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        let mut doc = lock(&self.doc);
        if doc.clipboard_fails {
            return Err(HostError::Clipboard("permission denied".to_string()));
        }
        doc.clipboard.push(text.to_string());
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        lock(&self.doc).notices.push(notice);
    }
}

/// Handle to an element of a [`MemoryHost`]
#[derive(Debug, Clone)]
pub struct MemoryElement {
    doc: Arc<Mutex<Document>>,
    id: usize,
}

impl MemoryElement {
    fn with<R>(&self, f: impl FnOnce(&mut ElementState) -> R) -> R {
        let mut doc = lock(&self.doc);
        f(&mut doc.elements[self.id])
    }

    /// Install an instance-level `value` override that swallows assignment
    pub fn shadow_value_property(&self) {
        self.with(|el| el.value_shadowed = true);
    }

    /// Plain `element.value = text`, which a shadowed element ignores
    pub fn assign_value(&self, text: &str) {
        self.with(|el| {
            if !el.value_shadowed {
                el.value = text.to_string();
            }
        });
    }

    pub fn value(&self) -> String {
        self.with(|el| el.value.clone())
    }

    pub fn text_content(&self) -> String {
        self.with(|el| el.text_content.clone())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.with(|el| el.events.clone())
    }

    pub fn is_focused(&self) -> bool {
        lock(&self.doc).focused == Some(self.id)
    }

    /// Whether both handles refer to the same node
    pub fn same_node(&self, other: &MemoryElement) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.id == other.id
    }
}

impl EditableElement for MemoryElement {
    fn capability(&self) -> Capability {
        self.with(|el| el.capability)
    }

    fn write_raw_value(&self, text: &str) {
        self.with(|el| el.value = text.to_string());
    }

    fn set_text_content(&self, text: &str) {
        self.with(|el| el.text_content = text.to_string());
    }

    fn focus(&self) {
        let mut doc = lock(&self.doc);
        if doc.focused != Some(self.id) {
            doc.select_all = false;
        }
        doc.focused = Some(self.id);
    }

    fn dispatch(&self, event: DomEvent, bubbles: bool) {
        self.with(|el| el.events.push(RecordedEvent { event, bubbles }));
    }
}
