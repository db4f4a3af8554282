use std::cmp::Ordering;

use super::{BlockCaret, CaretError, DocumentCursorHandle};
use crate::blocks::Document;

/// A pair of carets. `start` is the anchor and `end` the active end, so
/// `start` may come after `end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentSelection {
    pub start: BlockCaret,
    pub end: BlockCaret,
}

impl DocumentSelection {
    pub fn new(start: BlockCaret, end: BlockCaret) -> Self {
        Self { start, end }
    }

    pub fn collapsed(caret: BlockCaret) -> Self {
        Self::new(caret, caret)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A selection stored as two cursor handles, safe to keep across edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionHandle {
    pub anchor: DocumentCursorHandle,
    pub active: DocumentCursorHandle,
}

impl SelectionHandle {
    pub fn new(anchor: DocumentCursorHandle, active: DocumentCursorHandle) -> Self {
        Self { anchor, active }
    }

    pub fn collapsed(handle: DocumentCursorHandle) -> Self {
        Self::new(handle.clone(), handle)
    }

    pub fn from_selection(
        document: &Document,
        selection: DocumentSelection,
    ) -> Result<Self, CaretError> {
        Ok(Self::new(
            selection.start.serialize(document)?,
            selection.end.serialize(document)?,
        ))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.active
    }

    /// Moves both ends to `handle`.
    pub fn collapse_to(&mut self, handle: DocumentCursorHandle) {
        self.anchor = handle.clone();
        self.active = handle;
    }

    /// The two ends in document order.
    pub fn ordered(&self) -> (&DocumentCursorHandle, &DocumentCursorHandle) {
        match self.anchor.cmp_position(&self.active) {
            Ordering::Greater => (&self.active, &self.anchor),
            _ => (&self.anchor, &self.active),
        }
    }

    pub fn resolve(&self, document: &Document) -> Result<DocumentSelection, CaretError> {
        Ok(DocumentSelection::new(
            self.anchor.resolve(document)?,
            self.active.resolve(document)?,
        ))
    }
}
