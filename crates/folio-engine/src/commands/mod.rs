//! Commands: the entry points a front-end binds keys to.
//!
//! A command inspects an [`EditorContext`], builds the matching
//! [`UndoableAction`](crate::editing::UndoableAction), runs it through the
//! [`ActionStack`] and moves the selection to where the edit left the caret.

mod edit;
mod navigation;

pub use edit::{
    BreakBlock, ConvertBlock, DeleteNext, DeletePrevious, InsertText, Redo, ToggleStyle, Undo,
};
pub use navigation::{MoveCaret, MoveVertically, SelectAll};

use crate::blocks::{Document, DocumentError};
use crate::caret::{CaretError, DocumentCursorHandle, SelectionHandle, TextCaret};
use crate::editing::{ActionError, ActionStack};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("{0} cannot run in the current context")]
    NotActive(&'static str),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Caret(#[from] CaretError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub type CommandResult<T = ()> = Result<T, CommandError>;

/// A command that needs nothing beyond the editor state.
pub trait ContextualCommand {
    fn name(&self) -> &'static str;

    fn can_activate(&self, context: &EditorContext) -> bool;

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult;
}

/// A command that takes an argument, such as the text to insert.
pub trait ContextualCommandWith<TArg> {
    fn name(&self) -> &'static str;

    fn can_activate(&self, context: &EditorContext, arg: &TArg) -> bool;

    fn activate(
        &self,
        context: &mut EditorContext,
        actions: &mut ActionStack,
        arg: TArg,
    ) -> CommandResult;
}

/// The document being edited and the current selection.
#[derive(Debug)]
pub struct EditorContext {
    pub document: Document,
    pub selection: SelectionHandle,
}

impl EditorContext {
    /// Wraps `document` with the caret at its first position.
    pub fn new(document: Document) -> CommandResult<Self> {
        let start = document_start(&document)?;
        Ok(Self {
            document,
            selection: SelectionHandle::collapsed(start),
        })
    }

    /// The active end of the selection as a text caret.
    pub fn caret(&self) -> CommandResult<TextCaret> {
        Ok(self.selection.active.resolve_text(&self.document)?)
    }

    /// Ordered ends of the selection, both in the same text block.
    pub fn selected_range(&self) -> CommandResult<Option<(TextCaret, TextCaret)>> {
        if self.selection.is_collapsed() {
            return Ok(None);
        }
        let (start, end) = self.selection.ordered();
        let start = start.resolve_text(&self.document)?;
        let end = end.resolve_text(&self.document)?;
        if start.block != end.block {
            return Ok(None);
        }
        Ok(Some((start, end)))
    }

    pub fn set_caret(&mut self, caret: TextCaret) -> CommandResult {
        let handle = DocumentCursorHandle::for_text(&self.document, caret)?;
        self.selection.collapse_to(handle);
        Ok(())
    }

    /// Moves only the active end, extending the selection.
    pub fn extend_to(&mut self, caret: TextCaret) -> CommandResult {
        self.selection.active = DocumentCursorHandle::for_text(&self.document, caret)?;
        Ok(())
    }

    /// Puts the caret back on a valid position after an edit that may
    /// have removed the block it pointed into.
    pub fn repair_selection(&mut self) -> CommandResult {
        if self.selection.resolve(&self.document).is_ok() {
            return Ok(());
        }
        let path = self.selection.active.path().clone();
        let fallback = match self.document.resolve_path(&path) {
            Ok(block) => self.document.last_content_block(block).and_then(|block| {
                TextCaret::at_end(&self.document, block)
                    .ok()
                    .and_then(|caret| DocumentCursorHandle::for_text(&self.document, caret).ok())
            }),
            Err(_) => None,
        };
        let handle = match fallback {
            Some(handle) => handle,
            None => document_start(&self.document)?,
        };
        self.selection.collapse_to(handle);
        Ok(())
    }
}

fn document_start(document: &Document) -> CommandResult<DocumentCursorHandle> {
    let first = document
        .first_content_block(document.root())
        .ok_or(CommandError::NotActive("editor"))?;
    let caret = TextCaret::at_start(document, first)?;
    Ok(DocumentCursorHandle::for_text(document, caret)?)
}
