//! Undoable editing.
//!
//! Every change to a [`Document`](crate::blocks::Document) that should be
//! undoable is an [`UndoableAction`] executed through an [`ActionStack`].
//! Actions keep the smallest pre-image that lets them invert themselves
//! (removed text, serialized block properties) and address blocks by path,
//! so undo still works after the blocks they touched were recreated.

mod action;
mod block_actions;
mod policy;
mod stack;
mod text_actions;

pub use action::{ActionError, ActionResult, AsAny, UndoableAction};
pub use block_actions::{
    BreakTextBlockAction, ConvertBlockAction, InsertBlockAction, InsertPosition,
    MergeTextBlocksAction, RemoveBlockAction,
};
pub use policy::{
    AlwaysMerge, Clock, DEFAULT_MERGE_WINDOW, ManualClock, MergePolicy, NeverMerge,
    StandardMergePolicy, SystemClock,
};
pub use stack::{ActionStack, DEFAULT_CAPACITY, UndoStackEntry};
pub use text_actions::{
    DeleteDirection, DeleteSelectionAction, DeleteTextAction, FormatTextAction, InsertTextAction,
};
