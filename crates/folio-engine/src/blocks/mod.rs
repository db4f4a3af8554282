//! The mutable block tree.
//!
//! Blocks live in an arena owned by [`Document`] and refer to each other
//! through [`BlockId`]s: a collection stores its first/last child and a
//! count, every block stores its parent and siblings. Freed slots bump their
//! generation, so an id kept across a removal stops resolving instead of
//! silently aliasing a new block. Anything that must outlive a structural
//! edit is addressed by [`BlockPath`] instead.

mod block;
mod descriptor;
mod document;
mod edit;
mod observer;
mod path;
mod serialize;

use std::fmt;

pub use block::{Block, BlockData};
pub use descriptor::{
    BlockCategory, BlockDescriptor, BlockRegistry, PropertyDescriptor, ids,
};
pub use document::{Children, Document, DocumentId};
pub use edit::{BreakKind, BreakOutcome};
pub use observer::{BlockEvent, BlockTreeObserver};
pub use path::BlockPath;
pub use serialize::{RUN_TYPE, SerializedNode};

use crate::text::TextError;

/// Arena handle of a block inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Structural direction used when a caret has to leave its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    /// Leaving through the top edge, e.g. caret up on the first line.
    /// Reaches the same neighbour as `Backward`.
    Top,
    /// Leaving through the bottom edge; reaches the same neighbour as
    /// `Forward`.
    Bottom,
}

impl Direction {
    /// True for directions that walk towards the end of the document.
    pub fn is_downstream(self) -> bool {
        matches!(self, Direction::Forward | Direction::Bottom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("block {0} does not exist in this document")]
    UnknownBlock(BlockId),
    #[error("block {0} is not attached to the document")]
    NotAttached(BlockId),
    #[error("block {0} is already attached to a collection")]
    AlreadyAttached(BlockId),
    #[error("block {0} is not a collection")]
    NotACollection(BlockId),
    #[error("block {0} is not a text block")]
    NotATextBlock(BlockId),
    #[error("cannot remove {0}, the last child of its collection")]
    LastChild(BlockId),
    #[error("the document root cannot be moved, replaced or removed")]
    RootBlock,
    #[error("attaching {block} under {parent} would create a cycle")]
    Cycle { parent: BlockId, block: BlockId },
    #[error("no block at path {0}")]
    InvalidPath(BlockPath),
    #[error("unknown block descriptor: {0}")]
    UnknownDescriptor(String),
    #[error("block descriptor {0} is already registered")]
    DuplicateDescriptor(String),
    #[error("invalid value {value:?} for property {name} of {descriptor}")]
    InvalidProperty {
        descriptor: String,
        name: String,
        value: String,
    },
    #[error("cannot convert a {from} block into a {to} block")]
    IncompatibleConversion { from: String, to: String },
    #[error("malformed serialized node: {0}")]
    MalformedNode(String),
    #[error(transparent)]
    Text(#[from] TextError),
}
