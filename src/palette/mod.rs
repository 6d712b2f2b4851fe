//! The command palette
//!
//! [`PaletteController`] owns the whole flow from the activation keystroke
//! to the inserted text:
//!
//! ```text
//! Closed --activator in editable element--> Searching
//! Searching --select, no placeholders--> inject --> Closed
//! Searching --select, placeholders--> AwaitingVariables
//! AwaitingVariables --confirm--> substitute --> inject --> Closed
//! AwaitingVariables --cancel--> Closed
//! any open state --Escape / backdrop click--> Closed
//! ```
//!
//! The element that had focus when the palette opened is captured as the
//! injection target and released on every path back to `Closed`.

mod context;
mod view;

use thiserror::Error;
use tracing::{debug, warn};

use crate::collect::{CollectError, FormOutcome, SurfaceHandle, VariableForm, VariableSurface};
use crate::host::{EditableElement, Host, Notice};
use crate::inject::{inject, InjectError, InjectOutcome};
use crate::keys::{KeyEvent, ARROW_DOWN, ARROW_UP, ENTER, ESCAPE, TAB};
use crate::model::{Snippet, VariableValues};
use crate::search::FuzzyIndex;
use crate::storage::StorageError;

pub use context::AppContext;
pub use view::{preview, EmptyState, EntryView, PaletteView, DEFAULT_PREVIEW_LENGTH};

/// Notice text when the snippet list cannot be read
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load snippets. Extension may need to be reloaded.";

/// Reasons the palette refused to open
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("extension context invalidated, page needs a refresh")]
    RuntimeLost,

    #[error("palette is already open")]
    AlreadyOpen,

    #[error("focused element cannot receive text")]
    NotEditable,

    #[error("failed to load snippets: {0}")]
    Load(#[source] StorageError),
}

/// Whether the host should suppress its default handling of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteState {
    Closed,
    Searching,
    AwaitingVariables,
}

/// What selecting a snippet led to
#[derive(Debug)]
pub enum Dispatch {
    /// The text was injected (or copied) and the palette closed
    Injected(Result<InjectOutcome, InjectError>),
    /// The variable form is open
    AwaitingVariables,
}

struct Searching {
    snippets: Vec<Snippet>,
    index: FuzzyIndex,
    query: String,
    /// Positions into `snippets`, best match first
    filtered: Vec<usize>,
    selected: usize,
}

struct Awaiting {
    snippet: Snippet,
    form: VariableForm,
    handle: SurfaceHandle,
}

enum State {
    Closed,
    Searching(Searching),
    AwaitingVariables(Awaiting),
}

/// Palette state machine bound to one host document
pub struct PaletteController<H: Host> {
    host: H,
    ctx: AppContext,
    surface: Option<Box<dyn VariableSurface>>,
    state: State,
    target: Option<H::Element>,
    /// Once the runtime link is seen dead it stays dead for this page
    runtime_lost: bool,
    last_outcome: Option<InjectOutcome>,
}

impl<H: Host> PaletteController<H> {
    pub fn new(host: H, ctx: AppContext) -> Self {
        Self {
            host,
            ctx,
            surface: None,
            state: State::Closed,
            target: None,
            runtime_lost: false,
            last_outcome: None,
        }
    }

    /// Render variable forms through `surface`
    pub fn with_surface(mut self, surface: impl VariableSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Mutable access, e.g. to call [`AppContext::refresh_settings`]
    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    pub fn state(&self) -> PaletteState {
        match self.state {
            State::Closed => PaletteState::Closed,
            State::Searching(_) => PaletteState::Searching,
            State::AwaitingVariables(_) => PaletteState::AwaitingVariables,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Closed)
    }

    /// The captured injection target, if any
    pub fn target(&self) -> Option<&H::Element> {
        self.target.as_ref()
    }

    /// How the latest injection ended: inserted in place or copied
    ///
    /// `None` before the first injection or when the latest one failed.
    /// Keyboard-driven selection reports through here, since
    /// [`on_key_down`](Self::on_key_down) only returns a [`KeyDisposition`].
    pub fn last_outcome(&self) -> Option<InjectOutcome> {
        self.last_outcome
    }

    /// Route a keydown from the page
    ///
    /// `focused` is the element the event was raised in. While closed only
    /// the activator is handled. While searching, Escape, Enter and the
    /// arrow keys are handled and everything else goes to the search input.
    /// While the variable form is open, keys go to the form.
    pub async fn on_key_down(
        &mut self,
        event: &KeyEvent,
        focused: Option<&H::Element>,
    ) -> KeyDisposition {
        match self.state() {
            PaletteState::Closed => {
                if !self.ctx.activator().matches(event) {
                    return KeyDisposition::Ignored;
                }
                let Some(element) = focused.filter(|el| el.is_editable()) else {
                    return KeyDisposition::Ignored;
                };
                match self.activate(element.clone()).await {
                    Ok(()) => KeyDisposition::Consumed,
                    Err(PaletteError::RuntimeLost) => KeyDisposition::Ignored,
                    Err(_) => KeyDisposition::Consumed,
                }
            }
            PaletteState::Searching => {
                if event.is(ESCAPE) {
                    self.close();
                } else if event.is(ARROW_DOWN) {
                    self.move_selection(1);
                } else if event.is(ARROW_UP) {
                    self.move_selection(-1);
                } else if event.is(ENTER) {
                    self.select_current().await;
                } else {
                    return KeyDisposition::Ignored;
                }
                KeyDisposition::Consumed
            }
            PaletteState::AwaitingVariables => {
                let outcome = match &mut self.state {
                    State::AwaitingVariables(awaiting) => awaiting.form.handle_key(event),
                    _ => return KeyDisposition::Ignored,
                };
                match outcome {
                    FormOutcome::Pending if event.is(TAB) => KeyDisposition::Consumed,
                    FormOutcome::Pending => KeyDisposition::Ignored,
                    FormOutcome::Cancelled => {
                        self.cancel_variables();
                        KeyDisposition::Consumed
                    }
                    FormOutcome::Confirmed(values) => {
                        if let Some(awaiting) = self.take_awaiting() {
                            // Failures were already reported to the page
                            let _ = self.finish(awaiting, values).await;
                        }
                        KeyDisposition::Consumed
                    }
                }
            }
        }
    }

    /// Open the palette for `target`
    ///
    /// Rejected with a page notice when the runtime link is gone or the
    /// snippets cannot be loaded; the palette then stays closed and nothing
    /// is captured.
    pub async fn activate(&mut self, target: H::Element) -> Result<(), PaletteError> {
        if self.is_open() {
            debug!("palette already open, ignoring activation");
            return Err(PaletteError::AlreadyOpen);
        }
        if !target.is_editable() {
            return Err(PaletteError::NotEditable);
        }
        if self.runtime_lost || !self.host.runtime_alive() {
            self.runtime_lost = true;
            warn!("extension context invalidated, cannot open palette");
            self.host.notify(Notice::ExtensionReloaded);
            return Err(PaletteError::RuntimeLost);
        }

        let snippets = match self.ctx.snippets().get_all().await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!(error = %e, "failed to load snippets");
                self.host.notify(Notice::Error(LOAD_FAILED_MESSAGE.to_string()));
                return Err(PaletteError::Load(e));
            }
        };

        let index = FuzzyIndex::new(&snippets, self.ctx.search());
        let filtered = (0..snippets.len()).collect();
        debug!(count = snippets.len(), "palette opened");
        self.target = Some(target);
        self.state = State::Searching(Searching {
            snippets,
            index,
            query: String::new(),
            filtered,
            selected: 0,
        });
        Ok(())
    }

    /// Filter the list; a blank query shows everything
    pub fn set_query(&mut self, query: &str) {
        if let State::Searching(searching) = &mut self.state {
            searching.query = query.to_string();
            searching.filtered = searching
                .index
                .search(query)
                .into_iter()
                .map(|hit| hit.index)
                .collect();
            searching.selected = 0;
        }
    }

    /// Move the cursor, clamped to the visible entries
    pub fn move_selection(&mut self, delta: isize) {
        if let State::Searching(searching) = &mut self.state {
            let last = searching.filtered.len().saturating_sub(1);
            searching.selected = searching.selected.saturating_add_signed(delta).min(last);
        }
    }

    /// Pointer entered the entry at `position`
    pub fn hover(&mut self, position: usize) {
        if let State::Searching(searching) = &mut self.state {
            if position < searching.filtered.len() {
                searching.selected = position;
            }
        }
    }

    /// Snippet under the cursor
    pub fn selected_snippet(&self) -> Option<&Snippet> {
        match &self.state {
            State::Searching(searching) => searching
                .filtered
                .get(searching.selected)
                .map(|&i| &searching.snippets[i]),
            _ => None,
        }
    }

    /// Select the snippet under the cursor (Enter)
    pub async fn select_current(&mut self) -> Option<Dispatch> {
        let position = match &self.state {
            State::Searching(searching) => searching.selected,
            _ => return None,
        };
        self.select_at(position).await
    }

    /// Select the visible entry at `position` (pointer click)
    ///
    /// A snippet without placeholders is injected right away. Otherwise the
    /// list closes, the target stays captured and the variable form opens.
    pub async fn select_at(&mut self, position: usize) -> Option<Dispatch> {
        let snippet = match &self.state {
            State::Searching(searching) => searching
                .filtered
                .get(position)
                .map(|&i| searching.snippets[i].clone())?,
            _ => return None,
        };

        match VariableForm::open(&snippet.title, &snippet.resolved_variables()) {
            Err(CollectError::NoVariables) => {
                debug!(id = %snippet.id, "inserting snippet");
                let result = self.deliver(&snippet.body).await;
                self.close();
                Some(Dispatch::Injected(result))
            }
            Ok(form) => {
                let handle = match &self.surface {
                    Some(surface) => surface.mount(&form),
                    None => SurfaceHandle::noop(),
                };
                debug!(id = %snippet.id, fields = form.fields().len(), "collecting variables");
                self.state = State::AwaitingVariables(Awaiting {
                    snippet,
                    form,
                    handle,
                });
                Some(Dispatch::AwaitingVariables)
            }
        }
    }

    /// The open variable form
    pub fn variable_form(&self) -> Option<&VariableForm> {
        match &self.state {
            State::AwaitingVariables(awaiting) => Some(&awaiting.form),
            _ => None,
        }
    }

    /// The open variable form, for writing field contents
    pub fn variable_form_mut(&mut self) -> Option<&mut VariableForm> {
        match &mut self.state {
            State::AwaitingVariables(awaiting) => Some(&mut awaiting.form),
            _ => None,
        }
    }

    /// Submit the variable form
    ///
    /// Substitutes the current field values, injects the result and
    /// releases the target. `None` when no form is open.
    pub async fn confirm_variables(&mut self) -> Option<Result<InjectOutcome, InjectError>> {
        let awaiting = self.take_awaiting()?;
        let values = awaiting.form.confirm();
        Some(self.finish(awaiting, values).await)
    }

    /// Dismiss the variable form without injecting
    pub fn cancel_variables(&mut self) -> bool {
        match self.take_awaiting() {
            Some(awaiting) => {
                awaiting.handle.dispose();
                self.target = None;
                debug!("variable collection cancelled");
                true
            }
            None => false,
        }
    }

    /// Click on the backdrop outside the palette or form
    pub fn on_backdrop_click(&mut self) {
        self.close();
    }

    /// Return to `Closed` from any state, releasing the target
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::AwaitingVariables(awaiting) => awaiting.handle.dispose(),
            State::Searching(_) | State::Closed => {}
        }
        if self.target.take().is_some() {
            debug!("palette closed");
        }
    }

    /// Snapshot of the result list; `None` unless searching
    pub fn view(&self) -> Option<PaletteView> {
        let State::Searching(searching) = &self.state else {
            return None;
        };
        let preview_length = self.ctx.preview_length();
        let entries = searching
            .filtered
            .iter()
            .enumerate()
            .map(|(position, &i)| {
                EntryView::new(
                    &searching.snippets[i],
                    preview_length,
                    position == searching.selected,
                )
            })
            .collect::<Vec<_>>();
        let empty = if !entries.is_empty() {
            None
        } else if searching.snippets.is_empty() {
            Some(EmptyState::NoSnippets)
        } else {
            Some(EmptyState::NoMatches)
        };
        Some(PaletteView {
            query: searching.query.clone(),
            entries,
            empty,
        })
    }

    fn take_awaiting(&mut self) -> Option<Awaiting> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::AwaitingVariables(awaiting) => Some(awaiting),
            other => {
                self.state = other;
                None
            }
        }
    }

    async fn finish(
        &mut self,
        awaiting: Awaiting,
        values: VariableValues,
    ) -> Result<InjectOutcome, InjectError> {
        let Awaiting {
            snippet, handle, ..
        } = awaiting;
        handle.dispose();
        let text = snippet.render(&values);
        debug!(id = %snippet.id, "inserting snippet with variables");
        let result = self.deliver(&text).await;
        self.target = None;
        result
    }

    async fn deliver(&mut self, text: &str) -> Result<InjectOutcome, InjectError> {
        let result = inject(&self.host, self.target.as_ref(), text).await;
        self.last_outcome = result.as_ref().ok().copied();
        result
    }
}
