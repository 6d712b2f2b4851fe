//! Collecting values for a snippet's variables
//!
//! A [`VariableForm`] holds one field per resolved variable. It lives for one
//! snippet selection: it is opened when a snippet with placeholders is picked
//! and dropped on confirm or cancel. The values handed back on confirm are
//! always read from the fields' current contents.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::keys::{KeyEvent, ENTER, ESCAPE, TAB};
use crate::model::{ResolvedVariable, VariableValues};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    /// Callers skip collection entirely when the body has no placeholders
    #[error("no variables to collect")]
    NoVariables,
}

/// One input of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub description: Option<String>,
    /// Current content, initially the declared default or empty
    pub value: String,
}

impl FormField {
    /// Text shown next to the input
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }
}

/// What a key press did to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Still collecting
    Pending,
    Confirmed(VariableValues),
    Cancelled,
}

/// Transient state of the variable collection surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableForm {
    title: String,
    fields: Vec<FormField>,
    focused: usize,
}

impl VariableForm {
    /// Build a form for `variables`, focusing the first field
    pub fn open(
        title: impl Into<String>,
        variables: &[ResolvedVariable],
    ) -> Result<Self, CollectError> {
        if variables.is_empty() {
            return Err(CollectError::NoVariables);
        }
        let fields = variables
            .iter()
            .map(|var| FormField {
                name: var.name.clone(),
                description: var.description.clone(),
                value: var.default_value.clone().unwrap_or_default(),
            })
            .collect();
        Ok(Self {
            title: title.into(),
            fields,
            focused: 0,
        })
    }

    /// Title of the snippet being filled in
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn focused_field(&self) -> &FormField {
        &self.fields[self.focused]
    }

    /// Replace a field's content; returns false for unknown names
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Replace the focused field's content
    pub fn set_focused_value(&mut self, value: impl Into<String>) {
        self.fields[self.focused].value = value.into();
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }

    /// Values for exactly the form's variables, read from current field contents
    pub fn confirm(&self) -> VariableValues {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Route a key press
    ///
    /// Escape cancels, Enter confirms (Shift+Enter is left to the input so a
    /// multi-line value can be typed), Tab and Shift+Tab move focus.
    pub fn handle_key(&mut self, event: &KeyEvent) -> FormOutcome {
        if event.is(ESCAPE) {
            FormOutcome::Cancelled
        } else if event.is(ENTER) && !event.shift {
            FormOutcome::Confirmed(self.confirm())
        } else if event.is(TAB) {
            if event.shift {
                self.focus_prev();
            } else {
                self.focus_next();
            }
            FormOutcome::Pending
        } else {
            FormOutcome::Pending
        }
    }
}

/// Teardown callback for a rendered form
///
/// Every path that closes the form (confirm, cancel, Escape, outside click)
/// ends in [`SurfaceHandle::dispose`]; dropping the handle disposes it too.
pub struct SurfaceHandle {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl SurfaceHandle {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A handle with nothing to tear down
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("pending", &self.dispose.is_some())
            .finish()
    }
}

/// Something that can put a [`VariableForm`] on screen
pub trait VariableSurface: Send + Sync {
    /// Render the form with its first field focused
    fn mount(&self, form: &VariableForm) -> SurfaceHandle;
}

/// Line-based collection on a terminal
///
/// Prints one prompt per field with its current value in brackets; an empty
/// line keeps that value. End of input cancels.
pub fn prompt_terminal<R: BufRead, W: Write>(
    mut form: VariableForm,
    reader: &mut R,
    writer: &mut W,
) -> io::Result<Option<VariableValues>> {
    writeln!(writer, "{}", form.title())?;
    for index in 0..form.fields().len() {
        let field = &form.fields()[index];
        if field.value.is_empty() {
            write!(writer, "  {}: ", field.label())?;
        } else {
            write!(writer, "  {} [{}]: ", field.label(), field.value)?;
        }
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let input = line.trim_end_matches(['\r', '\n']);
        if !input.is_empty() {
            form.focused = index;
            form.set_focused_value(input);
        }
    }
    Ok(Some(form.confirm()))
}
