use std::collections::BTreeMap;

use super::action::{ActionError, ActionResult, UndoableAction};
use crate::blocks::{BlockId, BlockPath, BreakKind, Document, SerializedNode};
use crate::caret::DocumentCursorHandle;
use crate::text::TextBlockContent;

/// Splits the text block under a caret.
#[derive(Debug)]
pub struct BreakTextBlockAction {
    at: DocumentCursorHandle,
    applied: Option<(BreakKind, BlockPath)>,
}

impl BreakTextBlockAction {
    pub fn new(at: DocumentCursorHandle) -> Self {
        Self { at, applied: None }
    }

    /// How the last apply split the block.
    pub fn kind(&self) -> Option<BreakKind> {
        self.applied.as_ref().map(|(kind, _)| *kind)
    }
}

impl UndoableAction for BreakTextBlockAction {
    fn name(&self) -> &'static str {
        "break-block"
    }

    fn description(&self) -> String {
        "Split block".to_string()
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let caret = self.at.resolve_text(document)?;
        let outcome = document
            .break_text_block(caret)?
            .ok_or_else(|| ActionError::NotApplicable("block cannot be split".to_string()))?;
        let new_path = document.path_of(outcome.new_block)?;
        self.applied = Some((outcome.kind, new_path));
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let (kind, new_path) = self
            .applied
            .as_ref()
            .ok_or(ActionError::NotApplied("break-block"))?;
        let new_block = document.resolve_path(new_path)?;
        match kind {
            BreakKind::AtStart | BreakKind::AtEnd => document.remove_block(new_block)?,
            BreakKind::Middle => {
                document
                    .merge_with_previous(new_block)?
                    .ok_or_else(|| ActionError::NotApplicable("split block is gone".to_string()))?;
            }
        }
        Ok(())
    }
}

/// Joins a text block onto its previous sibling.
///
/// Undo recreates the removed block through the registry from its
/// serialized properties. Both blocks get back their own content as it was
/// before the merge, including the style of an empty block.
#[derive(Debug)]
pub struct MergeTextBlocksAction {
    block: BlockPath,
    applied: Option<AppliedMerge>,
}

#[derive(Debug)]
struct AppliedMerge {
    previous: BlockPath,
    properties: SerializedNode,
    previous_content: TextBlockContent,
    tail_content: TextBlockContent,
}

impl MergeTextBlocksAction {
    /// Merges the block at `block` into the one before it.
    pub fn new(block: BlockPath) -> Self {
        Self {
            block,
            applied: None,
        }
    }
}

impl UndoableAction for MergeTextBlocksAction {
    fn name(&self) -> &'static str {
        "merge-blocks"
    }

    fn description(&self) -> String {
        "Merge blocks".to_string()
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let block = document.resolve_path(&self.block)?;
        let properties = document.serialize_properties(block)?;
        let Some(previous) = document.block(block)?.previous_block() else {
            return Err(ActionError::NotApplicable(
                "first block has nothing to merge with".to_string(),
            ));
        };
        let previous_path = document.path_of(previous)?;
        let (Ok(previous_content), Ok(tail_content)) = (
            document.text_content(previous).map(TextBlockContent::deep_clone),
            document.text_content(block).map(TextBlockContent::deep_clone),
        ) else {
            return Err(ActionError::NotApplicable(
                "only text blocks can be merged".to_string(),
            ));
        };

        document
            .merge_with_previous(block)?
            .ok_or_else(|| ActionError::NotApplicable("blocks cannot be merged".to_string()))?;
        self.applied = Some(AppliedMerge {
            previous: previous_path,
            properties,
            previous_content,
            tail_content,
        });
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let applied = self
            .applied
            .as_ref()
            .ok_or(ActionError::NotApplied("merge-blocks"))?;
        let previous = document.resolve_path(&applied.previous)?;
        let restored = document.deserialize(&applied.properties)?;
        document.set_text_content(restored, applied.tail_content.deep_clone())?;
        if let Err(error) = document.insert_block_after(previous, restored) {
            document.discard(restored)?;
            return Err(error.into());
        }
        document.set_text_content(previous, applied.previous_content.deep_clone())?;
        Ok(())
    }
}

/// Changes the type of a text block, e.g. paragraph to heading.
#[derive(Debug)]
pub struct ConvertBlockAction {
    block: BlockPath,
    descriptor: String,
    attributes: BTreeMap<String, String>,
    previous: Option<SerializedNode>,
}

impl ConvertBlockAction {
    pub fn new(
        block: BlockPath,
        descriptor: impl Into<String>,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            block,
            descriptor: descriptor.into(),
            attributes,
            previous: None,
        }
    }
}

impl UndoableAction for ConvertBlockAction {
    fn name(&self) -> &'static str {
        "convert-block"
    }

    fn description(&self) -> String {
        format!("Convert to {}", self.descriptor)
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let block = document.resolve_path(&self.block)?;
        let previous = document.serialize_properties(block)?;
        document.convert_block(block, &self.descriptor, &self.attributes)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let previous = self
            .previous
            .as_ref()
            .ok_or(ActionError::NotApplied("convert-block"))?;
        let block = document.resolve_path(&self.block)?;
        document.convert_block(block, &previous.type_id, &previous.attributes)?;
        Ok(())
    }
}

/// Where [`InsertBlockAction`] puts its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPosition {
    Before(BlockPath),
    After(BlockPath),
    /// As the last child of the collection at the path.
    AppendTo(BlockPath),
}

/// Inserts a block built from a serialized subtree.
#[derive(Debug)]
pub struct InsertBlockAction {
    position: InsertPosition,
    node: SerializedNode,
    inserted: Option<BlockPath>,
}

impl InsertBlockAction {
    pub fn new(position: InsertPosition, node: SerializedNode) -> Self {
        Self {
            position,
            node,
            inserted: None,
        }
    }

    /// Path of the inserted block after the last apply.
    pub fn inserted(&self) -> Option<&BlockPath> {
        self.inserted.as_ref()
    }
}

impl UndoableAction for InsertBlockAction {
    fn name(&self) -> &'static str {
        "insert-block"
    }

    fn description(&self) -> String {
        format!("Insert {}", self.node.type_id)
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let block = document.deserialize(&self.node)?;
        let attached = match &self.position {
            InsertPosition::Before(path) => document
                .resolve_path(path)
                .and_then(|reference| document.insert_block_before(reference, block)),
            InsertPosition::After(path) => document
                .resolve_path(path)
                .and_then(|reference| document.insert_block_after(reference, block)),
            InsertPosition::AppendTo(path) => document
                .resolve_path(path)
                .and_then(|parent| document.append(parent, block)),
        };
        if let Err(error) = attached {
            document.discard(block)?;
            return Err(error.into());
        }
        self.inserted = Some(document.path_of(block)?);
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let path = self
            .inserted
            .as_ref()
            .ok_or(ActionError::NotApplied("insert-block"))?;
        let block = document.resolve_path(path)?;
        document.remove_block(block)?;
        Ok(())
    }
}

/// Removes a block and its subtree; only the removed subtree is kept for
/// undo.
#[derive(Debug)]
pub struct RemoveBlockAction {
    block: BlockPath,
    removed: Option<SerializedNode>,
}

impl RemoveBlockAction {
    pub fn new(block: BlockPath) -> Self {
        Self {
            block,
            removed: None,
        }
    }
}

impl UndoableAction for RemoveBlockAction {
    fn name(&self) -> &'static str {
        "remove-block"
    }

    fn description(&self) -> String {
        "Remove block".to_string()
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let block = document.resolve_path(&self.block)?;
        let removed = document.serialize(block)?;
        document.remove_block(block)?;
        self.removed = Some(removed);
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let removed = self
            .removed
            .as_ref()
            .ok_or(ActionError::NotApplied("remove-block"))?;
        let parent_path = self
            .block
            .parent()
            .ok_or_else(|| ActionError::NotApplicable("the root cannot be restored".to_string()))?;
        let parent = document.resolve_path(&parent_path)?;
        let index = self.block.last_index().unwrap_or(0);

        let restored = document.deserialize(removed)?;
        let attached = attach_at(document, parent, index, restored);
        if attached.is_err() {
            document.discard(restored)?;
        }
        attached
    }
}

fn attach_at(document: &mut Document, parent: BlockId, index: usize, block: BlockId) -> ActionResult {
    if index == 0 {
        match document.first_block(parent)? {
            Some(first) => document.insert_block_before(first, block)?,
            None => document.append(parent, block)?,
        }
    } else {
        let previous = document
            .child_at(parent, index - 1)
            .ok_or_else(|| ActionError::NotApplicable(format!("no block before index {index}")))?;
        document.insert_block_after(previous, block)?;
    }
    Ok(())
}
