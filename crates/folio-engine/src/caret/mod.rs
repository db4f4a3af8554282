/*!
 * Carets: positions inside content blocks.
 *
 * A [`BlockCaret`] is plain data (a block id and four integer slots) plus a
 * `&'static` [`CaretMover`] that knows how to interpret them. Block kinds
 * plug into navigation by providing a mover; the usual way is to implement
 * the small [`SimpleCaret`] contract and expose a [`SimpleCaretMover`]
 * static, as [`TextCaret`] does.
 *
 * Raw carets must not be kept across structural edits. Wrap them in a
 * [`DocumentCursorHandle`] (path plus offset) first.
 */

mod block_caret;
mod handle;
mod mover;
mod selection;
mod text_caret;

pub use block_caret::BlockCaret;
pub use handle::DocumentCursorHandle;
pub use mover::{CaretMover, SimpleCaret, SimpleCaretMover};
pub use selection::{DocumentSelection, SelectionHandle};
pub use text_caret::{TEXT_CARET_MOVER, TextCaret};

use crate::blocks::{BlockData, BlockId, Direction, Document, DocumentError};
use crate::text::TextError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaretError {
    #[error("operation on an invalid caret")]
    Invalid,
    #[error("caret belongs to {found}, expected {expected}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("cursor handle belongs to another document")]
    ForeignDocument,
    #[error("block {0} has no caret positions")]
    NotAContentBlock(BlockId),
    #[error("caret position {offset} is past the end ({len})")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Text(#[from] TextError),
}

impl Document {
    /// The mover responsible for carets in `block`, if it is a content
    /// block.
    pub fn caret_mover_for(&self, block: BlockId) -> Result<&'static dyn CaretMover, CaretError> {
        match self.block(block)?.data() {
            BlockData::Text(_) => Ok(&TEXT_CARET_MOVER),
            BlockData::Collection { .. } => Err(CaretError::NotAContentBlock(block)),
        }
    }

    /// First caret position of `block`, descending into collections.
    /// [`BlockCaret::INVALID`] when there is no content block below it.
    pub fn caret_at_start(&self, block: BlockId) -> Result<BlockCaret, CaretError> {
        match self.first_content_block(block) {
            Some(content) => Ok(TextCaret::at_start(self, content)?.into()),
            None => Ok(BlockCaret::INVALID),
        }
    }

    pub fn caret_at_end(&self, block: BlockId) -> Result<BlockCaret, CaretError> {
        match self.last_content_block(block) {
            Some(content) => Ok(TextCaret::at_end(self, content)?.into()),
            None => Ok(BlockCaret::INVALID),
        }
    }

    /// Caret one position further in document order, moving into the next
    /// content block at a block end. `INVALID` at the end of the document.
    pub fn next_caret(&self, caret: BlockCaret) -> Result<BlockCaret, CaretError> {
        let moved = caret.move_forward(self)?;
        if !moved.is_invalid() {
            return Ok(moved);
        }
        let block = caret.block().ok_or(CaretError::Invalid)?;
        match self.get_block_to(Direction::Forward, block) {
            Some(next) => self.caret_at_start(next),
            None => Ok(BlockCaret::INVALID),
        }
    }

    pub fn previous_caret(&self, caret: BlockCaret) -> Result<BlockCaret, CaretError> {
        let moved = caret.move_backward(self)?;
        if !moved.is_invalid() {
            return Ok(moved);
        }
        let block = caret.block().ok_or(CaretError::Invalid)?;
        match self.get_block_to(Direction::Backward, block) {
            Some(previous) => self.caret_at_end(previous),
            None => Ok(BlockCaret::INVALID),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::ids;
    use crate::tests::document_with_paragraphs;
    use pretty_assertions::assert_eq;

    #[test]
    fn next_caret_crosses_into_following_block() {
        let doc = document_with_paragraphs(&["ab", "c"]);
        let blocks = doc.content_blocks();
        let end_of_first = doc.caret_at_end(blocks[0]).unwrap();

        let next = doc.next_caret(end_of_first).unwrap();
        assert_eq!(next, doc.caret_at_start(blocks[1]).unwrap());

        let back = doc.previous_caret(next).unwrap();
        assert_eq!(back, end_of_first);
    }

    #[test]
    fn document_edges_yield_invalid() {
        let doc = document_with_paragraphs(&["ab", "c"]);
        let start = doc.caret_at_start(doc.root()).unwrap();
        let end = doc.caret_at_end(doc.root()).unwrap();
        assert!(doc.previous_caret(start).unwrap().is_invalid());
        assert!(doc.next_caret(end).unwrap().is_invalid());
    }

    #[test]
    fn collections_have_no_mover() {
        let mut doc = Document::new();
        let quote = doc.create_block(ids::QUOTE).unwrap();
        assert!(matches!(
            doc.caret_mover_for(quote),
            Err(CaretError::NotAContentBlock(id)) if id == quote
        ));
        let inner = doc.first_block(quote).unwrap().unwrap();
        assert_eq!(doc.caret_mover_for(inner).unwrap().name(), "text");
    }
}
