use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;

use log::debug;

use super::{BlockCaret, CaretError, CaretMover, SimpleCaret, TextCaret};
use crate::blocks::{BlockId, BlockPath, Document, DocumentId};

/// A caret position that survives structural edits and undo.
///
/// The handle stores the owning document, the block path and the mover's
/// position index (a grapheme index for text). Resolution walks the path
/// from the root. The block found last time is cached together with the
/// document's structure revision and reused while that revision holds.
#[derive(Clone)]
pub struct DocumentCursorHandle {
    document: DocumentId,
    path: BlockPath,
    position: usize,
    mover: &'static dyn CaretMover,
    cache: Cell<Option<(u64, BlockId)>>,
}

impl DocumentCursorHandle {
    pub fn new(
        document: &Document,
        block: BlockId,
        position: usize,
        mover: &'static dyn CaretMover,
    ) -> Result<Self, CaretError> {
        let path = document.path_of(block)?;
        Ok(Self {
            document: document.id(),
            path,
            position,
            mover,
            cache: Cell::new(Some((document.structure_revision(), block))),
        })
    }

    /// A handle that has never been resolved; the first resolution walks
    /// the path.
    pub fn from_path(
        document: &Document,
        path: BlockPath,
        position: usize,
        mover: &'static dyn CaretMover,
    ) -> Self {
        Self {
            document: document.id(),
            path,
            position,
            mover,
            cache: Cell::new(None),
        }
    }

    pub fn for_text(document: &Document, caret: TextCaret) -> Result<Self, CaretError> {
        BlockCaret::from(caret).serialize(document)
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn path(&self) -> &BlockPath {
        &self.path
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn mover(&self) -> &'static dyn CaretMover {
        self.mover
    }

    /// Same block, another position.
    pub fn with_position(&self, position: usize) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub fn resolve_block(&self, document: &Document) -> Result<BlockId, CaretError> {
        if document.id() != self.document {
            return Err(CaretError::ForeignDocument);
        }
        if let Some((revision, block)) = self.cache.get() {
            if revision == document.structure_revision() && document.contains(block) {
                return Ok(block);
            }
            debug!("cursor cache for {} is stale, walking the path", self.path);
        }
        let block = document.resolve_path(&self.path)?;
        self.cache.set(Some((document.structure_revision(), block)));
        Ok(block)
    }

    pub fn resolve(&self, document: &Document) -> Result<BlockCaret, CaretError> {
        let block = self.resolve_block(document)?;
        self.mover.deserialize(document, block, self.position)
    }

    pub fn resolve_text(&self, document: &Document) -> Result<TextCaret, CaretError> {
        self.resolve(document)?.downcast::<TextCaret>()
    }

    /// Document order of two handles of the same document.
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.position.cmp(&other.position))
    }

    pub fn is_text(&self) -> bool {
        std::ptr::addr_eq(self.mover, TextCaret::mover() as &dyn CaretMover)
    }
}

impl PartialEq for DocumentCursorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
            && self.path == other.path
            && self.position == other.position
            && std::ptr::addr_eq(self.mover, other.mover)
    }
}

impl Eq for DocumentCursorHandle {}

impl fmt::Debug for DocumentCursorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCursorHandle")
            .field("path", &self.path)
            .field("position", &self.position)
            .field("mover", &self.mover.name())
            .finish()
    }
}

impl fmt::Display for DocumentCursorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.position)
    }
}
