//! The seam between the editing core and whatever renders it.
//!
//! The engine never lays text out. Vertical caret movement asks a
//! [`ContentBlockView`] where the caret is and where it should land, and
//! passes a [`CaretMovementMode`] along so the horizontal position survives
//! several moves in a row.

use crate::blocks::{BlockId, Document};
use crate::caret::{BlockCaret, CaretError};

/// Horizontal intent carried across vertical moves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CaretMovementMode {
    /// No preference; the view picks.
    #[default]
    None,
    /// Keep this x position (view units).
    Position(f32),
    /// Start of the line.
    Home,
    /// End of the line.
    End,
}

/// Rectangle of a caret or selection in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Layout queries a renderer answers for its content blocks.
pub trait ContentBlockView {
    /// Bounds of the range between two carets of one block; a collapsed
    /// range measures the caret itself.
    fn measure_selection_bounds(
        &self,
        document: &Document,
        start: BlockCaret,
        end: BlockCaret,
    ) -> Result<SelectionBounds, CaretError>;

    /// Caret on the first line of `block` for a move arriving from above.
    fn caret_from_top(
        &self,
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError>;

    /// Caret on the last line of `block` for a move arriving from below.
    fn caret_from_bottom(
        &self,
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError>;

    /// Caret one line up inside the same block, `INVALID` on the first line.
    fn caret_above(
        &self,
        _document: &Document,
        _caret: BlockCaret,
        _mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        Ok(BlockCaret::INVALID)
    }

    /// Caret one line down inside the same block, `INVALID` on the last
    /// line.
    fn caret_below(
        &self,
        _document: &Document,
        _caret: BlockCaret,
        _mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        Ok(BlockCaret::INVALID)
    }
}
