use std::fmt;

use super::{CaretError, CaretMover, DocumentCursorHandle, SimpleCaret};
use crate::blocks::{BlockId, Document};

/// Type-erased caret: data plus the mover that interprets it.
///
/// Two carets are equal when they share the same mover instance, block and
/// slots.
#[derive(Clone, Copy)]
pub struct BlockCaret {
    mover: Option<&'static dyn CaretMover>,
    block: Option<BlockId>,
    slots: [usize; 4],
}

impl BlockCaret {
    /// "No position": returned at block edges and for inapplicable
    /// operations.
    pub const INVALID: BlockCaret = BlockCaret {
        mover: None,
        block: None,
        slots: [0; 4],
    };

    pub fn new(mover: &'static dyn CaretMover, block: BlockId, slots: [usize; 4]) -> Self {
        Self {
            mover: Some(mover),
            block: Some(block),
            slots,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.mover.is_none()
    }

    pub fn mover(&self) -> Option<&'static dyn CaretMover> {
        self.mover
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    pub fn slots(&self) -> [usize; 4] {
        self.slots
    }

    fn require_mover(&self) -> Result<&'static dyn CaretMover, CaretError> {
        self.mover.ok_or(CaretError::Invalid)
    }

    /// Recovers the concrete caret type. Fails with
    /// [`CaretError::Mismatch`] when the caret belongs to another mover.
    pub fn downcast<T: SimpleCaret>(&self) -> Result<T, CaretError> {
        let mover = self.require_mover()?;
        let expected: &'static dyn CaretMover = T::mover();
        let block = self.block.ok_or(CaretError::Invalid)?;
        if !std::ptr::addr_eq(mover, expected) {
            return Err(CaretError::Mismatch {
                expected: expected.name(),
                found: mover.name(),
            });
        }
        Ok(T::from_slots(block, self.slots))
    }

    /// Like [`downcast`](Self::downcast) but `None` instead of an error.
    pub fn try_downcast<T: SimpleCaret>(&self) -> Option<T> {
        self.downcast().ok()
    }

    pub fn move_forward(&self, document: &Document) -> Result<BlockCaret, CaretError> {
        self.require_mover()?.move_forward(document, *self)
    }

    pub fn move_backward(&self, document: &Document) -> Result<BlockCaret, CaretError> {
        self.require_mover()?.move_backward(document, *self)
    }

    pub fn is_at_block_start(&self, document: &Document) -> Result<bool, CaretError> {
        self.require_mover()?.is_at_block_start(document, *self)
    }

    pub fn is_at_block_end(&self, document: &Document) -> Result<bool, CaretError> {
        self.require_mover()?.is_at_block_end(document, *self)
    }

    pub fn serialize(&self, document: &Document) -> Result<DocumentCursorHandle, CaretError> {
        self.require_mover()?.serialize(document, *self)
    }
}

impl Default for BlockCaret {
    fn default() -> Self {
        Self::INVALID
    }
}

impl PartialEq for BlockCaret {
    fn eq(&self, other: &Self) -> bool {
        let same_mover = match (self.mover, other.mover) {
            (Some(a), Some(b)) => std::ptr::addr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_mover && self.block == other.block && self.slots == other.slots
    }
}

impl Eq for BlockCaret {}

impl fmt::Debug for BlockCaret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mover, self.block) {
            (Some(mover), Some(block)) => f
                .debug_struct("BlockCaret")
                .field("mover", &mover.name())
                .field("block", &block)
                .field("slots", &self.slots)
                .finish(),
            _ => f.write_str("BlockCaret::INVALID"),
        }
    }
}
