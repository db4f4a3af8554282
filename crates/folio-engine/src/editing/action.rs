use std::any::Any;
use std::fmt;

use crate::blocks::{Document, DocumentError};
use crate::caret::CaretError;
use crate::text::TextError;

/// Downcasting support for trait objects.
///
/// Implemented for every `'static` type; [`UndoableAction::try_merge`] uses
/// it to get at the concrete type of the other action.
pub trait AsAny: 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The action does not apply to the current document state, e.g.
    /// deleting backwards at the start of a block.
    #[error("{0}")]
    NotApplicable(String),
    /// `undo` was called on an action that has not been applied.
    #[error("{0} has not been applied")]
    NotApplied(&'static str),
    #[error(transparent)]
    Caret(#[from] CaretError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Text(#[from] TextError),
}

pub type ActionResult<T = ()> = Result<T, ActionError>;

/// A reversible edit.
///
/// `apply` is called once when the action is first executed and again on
/// every redo, always against the state the action originally saw. `undo`
/// restores that state. Neither is transactional: an error can leave the
/// document partly modified.
pub trait UndoableAction: fmt::Debug + AsAny {
    /// Stable short name, e.g. `"insert-text"`.
    fn name(&self) -> &'static str;

    /// Human-readable description for menus and logs.
    fn description(&self) -> String {
        self.name().to_string()
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult;

    fn undo(&mut self, document: &mut Document) -> ActionResult;

    /// Tries to absorb `other`, which has just been applied, into `self`.
    /// On success `self` must undo and redo the effect of both.
    fn try_merge(&mut self, _document: &Document, _other: &dyn UndoableAction) -> bool {
        false
    }
}
