pub mod blocks;
pub mod caret;
pub mod commands;
pub mod editing;
pub mod io;
pub mod text;
pub mod view;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use blocks::{
    BlockId, BlockPath, BlockRegistry, Direction, Document, DocumentError, DocumentId,
    SerializedNode,
};
pub use caret::{BlockCaret, CaretError, DocumentCursorHandle, SelectionHandle, TextCaret};
pub use commands::{CommandError, ContextualCommand, ContextualCommandWith, EditorContext};
pub use editing::{ActionError, ActionStack, StandardMergePolicy, UndoableAction};
pub use io::{IoError, document_from_text, document_to_text, read_document, write_document};
pub use text::{StyleFlag, TextBlockContent, TextError, TextOffset, TextStyle};
pub use view::{CaretMovementMode, ContentBlockView, SelectionBounds};
