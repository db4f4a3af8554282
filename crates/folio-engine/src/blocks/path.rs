use std::fmt;

use super::{BlockId, Document, DocumentError};

/// Address of a block as child indices from the document root.
///
/// Unlike a [`BlockId`], a path survives the block being destroyed and
/// recreated, which is what undo relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPath(Vec<usize>);

impl BlockPath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// The path of the following sibling.
    pub fn next_sibling(&self) -> Option<Self> {
        let (last, parent) = self.0.split_last()?;
        let mut indices = parent.to_vec();
        indices.push(last + 1);
        Some(Self(indices))
    }
}

impl From<Vec<usize>> for BlockPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

impl Document {
    /// Path of an attached block.
    pub fn path_of(&self, id: BlockId) -> Result<BlockPath, DocumentError> {
        let mut indices = Vec::new();
        let mut current = id;
        while current != self.root() {
            indices.push(self.index_of(current)?);
            current = self
                .block(current)?
                .parent()
                .ok_or(DocumentError::NotAttached(current))?;
        }
        indices.reverse();
        Ok(BlockPath(indices))
    }

    pub fn resolve_path(&self, path: &BlockPath) -> Result<BlockId, DocumentError> {
        path.indices().iter().try_fold(self.root(), |current, &index| {
            self.child_at(current, index)
                .ok_or_else(|| DocumentError::InvalidPath(path.clone()))
        })
    }
}
