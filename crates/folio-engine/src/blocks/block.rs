use std::collections::BTreeMap;

use super::descriptor::BlockCategory;
use super::BlockId;
use crate::text::TextBlockContent;

/// Kind-specific payload of a block.
#[derive(Debug, Clone)]
pub enum BlockData {
    /// A container owning a doubly linked list of children.
    Collection {
        first: Option<BlockId>,
        last: Option<BlockId>,
        count: usize,
    },
    /// A content block holding styled text.
    Text(TextBlockContent),
}

impl BlockData {
    pub(crate) fn empty_collection() -> Self {
        BlockData::Collection {
            first: None,
            last: None,
            count: 0,
        }
    }

    pub fn category(&self) -> BlockCategory {
        match self {
            BlockData::Collection { .. } => BlockCategory::Collection,
            BlockData::Text(_) => BlockCategory::Text,
        }
    }
}

/// One node of the block tree.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) descriptor: &'static str,
    pub(crate) parent: Option<BlockId>,
    pub(crate) previous: Option<BlockId>,
    pub(crate) next: Option<BlockId>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) data: BlockData,
}

impl Block {
    pub(crate) fn new(
        descriptor: &'static str,
        attributes: BTreeMap<String, String>,
        data: BlockData,
    ) -> Self {
        Self {
            descriptor,
            parent: None,
            previous: None,
            next: None,
            attributes,
            data,
        }
    }

    /// Stable type id of the descriptor that created this block.
    pub fn descriptor_id(&self) -> &'static str {
        self.descriptor
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub fn previous_block(&self) -> Option<BlockId> {
        self.previous
    }

    pub fn next_block(&self) -> Option<BlockId> {
        self.next
    }

    pub fn is_first(&self) -> bool {
        self.previous.is_none()
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    pub fn category(&self) -> BlockCategory {
        self.data.category()
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.data, BlockData::Collection { .. })
    }

    pub fn text_content(&self) -> Option<&TextBlockContent> {
        match &self.data {
            BlockData::Text(content) => Some(content),
            BlockData::Collection { .. } => None,
        }
    }

    pub(crate) fn text_content_mut(&mut self) -> Option<&mut TextBlockContent> {
        match &mut self.data {
            BlockData::Text(content) => Some(content),
            BlockData::Collection { .. } => None,
        }
    }

    pub fn first_child(&self) -> Option<BlockId> {
        match self.data {
            BlockData::Collection { first, .. } => first,
            BlockData::Text(_) => None,
        }
    }

    pub fn last_child(&self) -> Option<BlockId> {
        match self.data {
            BlockData::Collection { last, .. } => last,
            BlockData::Text(_) => None,
        }
    }

    pub fn child_count(&self) -> usize {
        match self.data {
            BlockData::Collection { count, .. } => count,
            BlockData::Text(_) => 0,
        }
    }
}
