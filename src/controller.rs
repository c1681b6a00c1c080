//! Selection UI controller
//!
//! Sequencing for the transient affordances around markers: the action
//! button shown for a fresh selection, the compose form, and the detail
//! popover with its edit view. At most one is open at a time; opening one
//! replaces whatever was open before, and the replaced state is handed
//! back so the host can tear down its elements.
//!
//! ```text
//! Idle -> Selecting -> Composing -> Idle
//! Idle -> Viewing -> Editing -> Viewing
//! ```
//!
//! The controller owns no anchor logic; it delegates encoding to the
//! [`MarkerLayer`] and hands drafts and edits to the persistence layer.

use thiserror::Error;

use crate::anchor::{AnchorError, SelectionRange};
use crate::dom::TextTree;
use crate::layer::MarkerLayer;
use crate::markers::{MarkerDraft, MarkerId, MarkerKind};
use crate::persist::UpdatePayload;
use crate::resolver::ContainerResolver;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("cannot {action} while {state}")]
    IllegalTransition { action: &'static str, state: &'static str },

    #[error("note must not be empty")]
    EmptyNote,

    #[error("{0:?} markers carry no note")]
    NoNotes(MarkerKind),

    #[error(transparent)]
    Selection(#[from] AnchorError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiState {
    #[default]
    Idle,
    /// Action button visible for an encoded selection
    Selecting { draft: MarkerDraft },
    /// Compose form open
    Composing { draft: MarkerDraft },
    /// Detail popover open for a marker
    Viewing { id: MarkerId },
    /// Edit form open in the detail popover
    Editing { id: MarkerId },
}

impl UiState {
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Selecting { .. } => "selecting",
            UiState::Composing { .. } => "composing",
            UiState::Viewing { .. } => "viewing",
            UiState::Editing { .. } => "editing",
        }
    }

    /// Marker whose popover is open
    pub fn marker(&self) -> Option<&MarkerId> {
        match self {
            UiState::Viewing { id } | UiState::Editing { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    kind: MarkerKind,
    state: UiState,
}

impl SelectionController {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            state: UiState::Idle,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    fn has_notes(&self) -> bool {
        self.kind == MarkerKind::Annotation
    }

    fn illegal(&self, action: &'static str) -> ControllerError {
        ControllerError::IllegalTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Move to `next`, returning the state it replaces
    fn replace(&mut self, next: UiState) -> UiState {
        log::trace!("ui {} -> {}", self.state.name(), next.name());
        std::mem::replace(&mut self.state, next)
    }

    /// A selection finished; show the action button if it encodes
    ///
    /// Any open affordance is closed first. An invalid selection leaves the
    /// controller idle.
    pub fn select<T, R>(
        &mut self,
        layer: &MarkerLayer<R>,
        tree: &T,
        selection: &SelectionRange<T::Node>,
    ) -> Result<UiState, ControllerError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        match layer.encode_selection(tree, selection) {
            Ok(draft) => Ok(self.replace(UiState::Selecting { draft })),
            Err(err) => {
                log::debug!("selection rejected: {}", err);
                self.replace(UiState::Idle);
                Err(err.into())
            }
        }
    }

    /// Selection cleared without action
    pub fn clear_selection(&mut self) -> UiState {
        if matches!(self.state, UiState::Selecting { .. }) {
            self.replace(UiState::Idle)
        } else {
            UiState::Idle
        }
    }

    /// Action button pressed: open the compose form
    pub fn open_compose(&mut self) -> Result<&MarkerDraft, ControllerError> {
        if !self.has_notes() {
            return Err(ControllerError::NoNotes(self.kind));
        }
        let UiState::Selecting { draft } = &self.state else {
            return Err(self.illegal("compose"));
        };
        let draft = draft.clone();
        self.replace(UiState::Composing { draft });
        match &self.state {
            UiState::Composing { draft } => Ok(draft),
            _ => Err(self.illegal("compose")),
        }
    }

    /// Save pressed in the compose form; yields the payload to create
    ///
    /// The note is trimmed and must not be empty, in which case the form
    /// stays open.
    pub fn submit_note(&mut self, note: &str) -> Result<MarkerDraft, ControllerError> {
        if !matches!(self.state, UiState::Composing { .. }) {
            return Err(self.illegal("submit a note"));
        }
        let note = note.trim();
        if note.is_empty() {
            return Err(ControllerError::EmptyNote);
        }
        match self.replace(UiState::Idle) {
            UiState::Composing { draft } => Ok(draft.with_note(note)),
            _ => Err(self.illegal("submit a note")),
        }
    }

    /// Action button pressed for a marker kind without notes
    pub fn quick_draft(&mut self) -> Result<MarkerDraft, ControllerError> {
        if self.has_notes() {
            return Err(self.illegal("save without a note"));
        }
        if !matches!(self.state, UiState::Selecting { .. }) {
            return Err(self.illegal("save a selection"));
        }
        match self.replace(UiState::Idle) {
            UiState::Selecting { draft } => Ok(draft),
            _ => Err(self.illegal("save a selection")),
        }
    }

    /// A rendered marker was clicked; replaces any open affordance
    pub fn open_marker(&mut self, id: MarkerId) -> UiState {
        self.replace(UiState::Viewing { id })
    }

    pub fn begin_edit(&mut self) -> Result<&MarkerId, ControllerError> {
        if !self.has_notes() {
            return Err(ControllerError::NoNotes(self.kind));
        }
        let UiState::Viewing { id } = &self.state else {
            return Err(self.illegal("edit"));
        };
        let id = id.clone();
        self.replace(UiState::Editing { id });
        self.state.marker().ok_or(ControllerError::IllegalTransition {
            action: "edit",
            state: "idle",
        })
    }

    /// Cancel pressed: an edit returns to the detail view, anything else closes
    pub fn cancel(&mut self) -> UiState {
        let next = match &self.state {
            UiState::Editing { id } => UiState::Viewing { id: id.clone() },
            _ => UiState::Idle,
        };
        self.replace(next)
    }

    /// Save pressed in the edit form
    ///
    /// The form stays open until [`edit_saved`](Self::edit_saved) confirms
    /// the update.
    pub fn submit_edit(&self, note: &str) -> Result<(MarkerId, UpdatePayload), ControllerError> {
        let UiState::Editing { id } = &self.state else {
            return Err(self.illegal("submit an edit"));
        };
        let note = note.trim();
        if note.is_empty() {
            return Err(ControllerError::EmptyNote);
        }
        Ok((
            id.clone(),
            UpdatePayload {
                comment_text: note.to_string(),
            },
        ))
    }

    /// The update for `id` succeeded; back to the detail view
    pub fn edit_saved(&mut self, id: &MarkerId) {
        if matches!(&self.state, UiState::Editing { id: editing } if editing == id) {
            self.replace(UiState::Viewing { id: id.clone() });
        }
    }

    /// Delete pressed in the detail popover; closes it
    pub fn request_delete(&mut self) -> Result<MarkerId, ControllerError> {
        match &self.state {
            UiState::Viewing { .. } | UiState::Editing { .. } => {}
            _ => return Err(self.illegal("delete")),
        }
        match self.replace(UiState::Idle) {
            UiState::Viewing { id } | UiState::Editing { id } => Ok(id),
            _ => Err(self.illegal("delete")),
        }
    }

    /// Outside click or escape
    pub fn close(&mut self) -> UiState {
        self.replace(UiState::Idle)
    }
}
