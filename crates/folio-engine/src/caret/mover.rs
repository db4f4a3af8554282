use std::marker::PhantomData;

use super::{BlockCaret, CaretError, DocumentCursorHandle};
use crate::blocks::{BlockId, Document};

/// Navigation behaviour for one kind of caret.
///
/// Movers are stateless `'static` values; every method receives the caret
/// it should interpret. Moving past either edge of the block returns
/// [`BlockCaret::INVALID`] rather than an error.
pub trait CaretMover: Sync + 'static {
    /// Short stable name, used in diagnostics.
    fn name(&self) -> &'static str;

    fn move_forward(&self, document: &Document, caret: BlockCaret)
    -> Result<BlockCaret, CaretError>;

    fn move_backward(
        &self,
        document: &Document,
        caret: BlockCaret,
    ) -> Result<BlockCaret, CaretError>;

    fn is_at_block_start(&self, document: &Document, caret: BlockCaret) -> Result<bool, CaretError>;

    fn is_at_block_end(&self, document: &Document, caret: BlockCaret) -> Result<bool, CaretError>;

    fn block(&self, caret: BlockCaret) -> Option<BlockId>;

    /// Captures the caret as a durable handle (block path plus position).
    fn serialize(
        &self,
        document: &Document,
        caret: BlockCaret,
    ) -> Result<DocumentCursorHandle, CaretError>;

    /// Rebuilds a caret in `block` from a serialized position.
    fn deserialize(
        &self,
        document: &Document,
        block: BlockId,
        position: usize,
    ) -> Result<BlockCaret, CaretError>;
}

/// The primitive contract a concrete caret type implements to get a full
/// [`CaretMover`] through [`SimpleCaretMover`].
pub trait SimpleCaret: Copy + Sized + 'static {
    /// The static mover shared by all carets of this type.
    fn mover() -> &'static SimpleCaretMover<Self>;

    fn block(&self) -> BlockId;

    /// The following position, `None` at the end of the block.
    fn next_position(&self, document: &Document) -> Result<Option<Self>, CaretError>;

    /// The preceding position, `None` at the start of the block.
    fn previous_position(&self, document: &Document) -> Result<Option<Self>, CaretError>;

    fn is_valid(&self, document: &Document) -> bool;

    /// Position index stored in a [`DocumentCursorHandle`].
    fn position(&self, document: &Document) -> Result<usize, CaretError>;

    fn from_position(
        document: &Document,
        block: BlockId,
        position: usize,
    ) -> Result<Self, CaretError>;

    fn to_slots(&self) -> [usize; 4];

    fn from_slots(block: BlockId, slots: [usize; 4]) -> Self;

    fn into_block_caret(self) -> BlockCaret {
        BlockCaret::new(Self::mover(), self.block(), self.to_slots())
    }
}

/// Adapter implementing [`CaretMover`] on top of a [`SimpleCaret`].
pub struct SimpleCaretMover<T> {
    name: &'static str,
    marker: PhantomData<fn() -> T>,
}

impl<T> SimpleCaretMover<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            marker: PhantomData,
        }
    }
}

impl<T: SimpleCaret> SimpleCaretMover<T> {
    fn typed(&self, caret: BlockCaret) -> Result<T, CaretError> {
        caret.downcast::<T>()
    }

    fn wrap(position: Option<T>) -> BlockCaret {
        position.map_or(BlockCaret::INVALID, SimpleCaret::into_block_caret)
    }
}

impl<T: SimpleCaret> CaretMover for SimpleCaretMover<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn move_forward(
        &self,
        document: &Document,
        caret: BlockCaret,
    ) -> Result<BlockCaret, CaretError> {
        Ok(Self::wrap(self.typed(caret)?.next_position(document)?))
    }

    fn move_backward(
        &self,
        document: &Document,
        caret: BlockCaret,
    ) -> Result<BlockCaret, CaretError> {
        Ok(Self::wrap(self.typed(caret)?.previous_position(document)?))
    }

    fn is_at_block_start(&self, document: &Document, caret: BlockCaret) -> Result<bool, CaretError> {
        Ok(self.typed(caret)?.previous_position(document)?.is_none())
    }

    fn is_at_block_end(&self, document: &Document, caret: BlockCaret) -> Result<bool, CaretError> {
        Ok(self.typed(caret)?.next_position(document)?.is_none())
    }

    fn block(&self, caret: BlockCaret) -> Option<BlockId> {
        self.typed(caret).ok().map(|typed| typed.block())
    }

    fn serialize(
        &self,
        document: &Document,
        caret: BlockCaret,
    ) -> Result<DocumentCursorHandle, CaretError> {
        let typed = self.typed(caret)?;
        if !typed.is_valid(document) {
            return Err(CaretError::Invalid);
        }
        let position = typed.position(document)?;
        DocumentCursorHandle::new(document, typed.block(), position, T::mover())
    }

    fn deserialize(
        &self,
        document: &Document,
        block: BlockId,
        position: usize,
    ) -> Result<BlockCaret, CaretError> {
        Ok(T::from_position(document, block, position)?.into_block_caret())
    }
}
