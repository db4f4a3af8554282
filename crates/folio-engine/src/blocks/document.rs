use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::trace;
use uuid::Uuid;

use super::block::{Block, BlockData};
use super::descriptor::{BlockRegistry, DOCUMENT_DESCRIPTOR, PARAGRAPH_DESCRIPTOR};
use super::observer::{BlockEvent, BlockTreeObserver};
use super::{BlockId, Direction, DocumentError};
use crate::text::TextBlockContent;

/// Identity of a document instance; cursor handles refuse to resolve
/// against any other document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    block: Option<Block>,
}

/// A rich-text document: an arena of blocks rooted at a `document`
/// collection.
///
/// The root always exists and always has at least one child. Structural
/// mutations (`append`, `insert_block_*`, `replace`, `remove_block`) are
/// O(1) list splices that notify registered [`BlockTreeObserver`]s and bump
/// [`structure_revision`](Self::structure_revision); text edits only bump
/// [`revision`](Self::revision).
pub struct Document {
    id: DocumentId,
    registry: Arc<BlockRegistry>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: BlockId,
    revision: u64,
    structure_revision: u64,
    observers: Vec<Box<dyn BlockTreeObserver>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("revision", &self.revision)
            .field("structure_revision", &self.structure_revision)
            .field("blocks", &self.block_count())
            .finish()
    }
}

impl Clone for Document {
    /// Deep copy under a fresh [`DocumentId`]. Observers are not carried over.
    fn clone(&self) -> Self {
        Self {
            id: DocumentId::new(),
            registry: Arc::clone(&self.registry),
            slots: self.slots.clone(),
            free: self.free.clone(),
            root: self.root,
            revision: self.revision,
            structure_revision: self.structure_revision,
            observers: Vec::new(),
        }
    }
}

impl PartialEq for Document {
    /// Structural equality of the two trees; ids, revisions and fragment
    /// identities are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Document {
    /// An empty document using the standard block registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(BlockRegistry::standard()))
    }

    /// An empty document (root plus one paragraph). The root and default
    /// paragraph types are always available, whatever the registry holds.
    pub fn with_registry(registry: Arc<BlockRegistry>) -> Self {
        let mut document = Self::bare(registry, DOCUMENT_DESCRIPTOR.create_instance());
        let paragraph = document.alloc(PARAGRAPH_DESCRIPTOR.create_instance());
        document.link_after(document.root, None, paragraph);
        document
    }

    /// A document whose root has no children yet; only used while
    /// deserializing.
    pub(crate) fn bare(registry: Arc<BlockRegistry>, root: Block) -> Self {
        let mut document = Self {
            id: DocumentId::new(),
            registry,
            slots: Vec::new(),
            free: Vec::new(),
            root: BlockId {
                index: 0,
                generation: 0,
            },
            revision: 0,
            structure_revision: 0,
            observers: Vec::new(),
        };
        document.root = document.alloc(root);
        document
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    /// Incremented by every mutation, structural or textual.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Incremented only when blocks are attached, detached or replaced.
    pub fn structure_revision(&self) -> u64 {
        self.structure_revision
    }

    /// Number of live blocks in the arena, attached or not.
    pub fn block_count(&self) -> usize {
        self.slots.iter().filter(|s| s.block.is_some()).count()
    }

    pub fn add_observer(&mut self, observer: Box<dyn BlockTreeObserver>) {
        self.observers.push(observer);
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    // ---- arena ---------------------------------------------------------

    pub fn contains(&self, id: BlockId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|s| s.generation == id.generation && s.block.is_some())
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, DocumentError> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.block.as_ref())
            .ok_or(DocumentError::UnknownBlock(id))
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, DocumentError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.block.as_mut())
            .ok_or(DocumentError::UnknownBlock(id))
    }

    pub(crate) fn alloc(&mut self, block: Block) -> BlockId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.block = Some(block);
            BlockId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                block: Some(block),
            });
            BlockId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    /// Frees `id` and everything below it. Links are not touched; callers
    /// unlink first.
    fn free_subtree(&mut self, id: BlockId) {
        let children: Vec<BlockId> = self.children(id).collect();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
            && slot.block.take().is_some()
        {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    /// Discards a detached block that was created but never attached.
    pub fn discard(&mut self, id: BlockId) -> Result<(), DocumentError> {
        self.ensure_detached(id)?;
        self.free_subtree(id);
        Ok(())
    }

    // ---- creation ------------------------------------------------------

    /// Instantiates a detached block through its registered descriptor.
    /// Collections receive their default child.
    pub fn create_block(&mut self, descriptor_id: &str) -> Result<BlockId, DocumentError> {
        let descriptor = self.registry.get(descriptor_id)?;
        let block = descriptor.create_instance();
        let default_child = descriptor.default_child;
        let id = self.alloc(block);
        if let Some(child_type) = default_child {
            let child_descriptor = self.registry.get(child_type)?;
            let child = self.alloc(child_descriptor.create_instance());
            self.link_after(id, None, child);
        }
        Ok(id)
    }

    /// Like [`create_block`](Self::create_block), then applies validated
    /// property values.
    pub fn create_block_with(
        &mut self,
        descriptor_id: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<BlockId, DocumentError> {
        let descriptor = self.registry.get(descriptor_id)?;
        for (name, value) in attributes {
            descriptor.validate_property(name, value)?;
        }
        let id = self.create_block(descriptor_id)?;
        self.block_mut(id)?
            .attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(id)
    }

    /// Creates a detached text block holding `content`.
    pub fn create_text_block(
        &mut self,
        descriptor_id: &str,
        content: TextBlockContent,
    ) -> Result<BlockId, DocumentError> {
        let id = self.create_block(descriptor_id)?;
        self.set_text_content(id, content)?;
        Ok(id)
    }

    pub fn set_attribute(
        &mut self,
        id: BlockId,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, DocumentError> {
        let descriptor = self.block(id)?.descriptor;
        self.registry.get(descriptor)?.validate_property(name, value)?;
        self.revision += 1;
        Ok(self
            .block_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string()))
    }

    // ---- text access ---------------------------------------------------

    pub fn text_content(&self, id: BlockId) -> Result<&TextBlockContent, DocumentError> {
        self.block(id)?
            .text_content()
            .ok_or(DocumentError::NotATextBlock(id))
    }

    /// Mutable content access; counts as a (non-structural) revision.
    pub fn text_content_mut(
        &mut self,
        id: BlockId,
    ) -> Result<&mut TextBlockContent, DocumentError> {
        self.text_content(id)?;
        self.revision += 1;
        self.block_mut(id)?
            .text_content_mut()
            .ok_or(DocumentError::NotATextBlock(id))
    }

    /// Full text of a text block.
    pub fn text(&self, id: BlockId) -> Result<String, DocumentError> {
        Ok(self.text_content(id)?.text().into_owned())
    }

    pub fn set_text(&mut self, id: BlockId, text: &str) -> Result<(), DocumentError> {
        self.set_text_content(id, TextBlockContent::from_text(text))
            .map(|_| ())
    }

    /// Swaps in new content and returns the previous one.
    pub fn set_text_content(
        &mut self,
        id: BlockId,
        content: TextBlockContent,
    ) -> Result<TextBlockContent, DocumentError> {
        Ok(std::mem::replace(self.text_content_mut(id)?, content))
    }

    // ---- navigation ----------------------------------------------------

    /// Children of a collection in order; empty for text blocks and
    /// unknown ids.
    pub fn children(&self, parent: BlockId) -> Children<'_> {
        Children {
            document: self,
            next: self.block(parent).ok().and_then(Block::first_child),
        }
    }

    pub fn child_count(&self, parent: BlockId) -> Result<usize, DocumentError> {
        let block = self.block(parent)?;
        if !block.is_collection() {
            return Err(DocumentError::NotACollection(parent));
        }
        Ok(block.child_count())
    }

    pub fn first_block(&self, parent: BlockId) -> Result<Option<BlockId>, DocumentError> {
        Ok(self.block(parent)?.first_child())
    }

    pub fn last_block(&self, parent: BlockId) -> Result<Option<BlockId>, DocumentError> {
        Ok(self.block(parent)?.last_child())
    }

    pub fn child_at(&self, parent: BlockId, index: usize) -> Option<BlockId> {
        self.children(parent).nth(index)
    }

    /// Position of `id` among its siblings.
    pub fn index_of(&self, id: BlockId) -> Result<usize, DocumentError> {
        let mut block = self.block(id)?;
        if block.parent.is_none() {
            return Err(DocumentError::NotAttached(id));
        }
        let mut index = 0;
        while let Some(previous) = block.previous {
            block = self.block(previous)?;
            index += 1;
        }
        Ok(index)
    }

    /// True when `id` is attached somewhere below the root.
    pub fn is_attached(&self, id: BlockId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.block(current).ok().and_then(Block::parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// First content block at or below `id`, depth first.
    pub fn first_content_block(&self, id: BlockId) -> Option<BlockId> {
        let block = self.block(id).ok()?;
        if !block.is_collection() {
            return Some(id);
        }
        self.children(id).find_map(|child| self.first_content_block(child))
    }

    /// Last content block at or below `id`.
    pub fn last_content_block(&self, id: BlockId) -> Option<BlockId> {
        let block = self.block(id).ok()?;
        if !block.is_collection() {
            return Some(id);
        }
        let mut child = block.last_child();
        while let Some(current) = child {
            if let Some(found) = self.last_content_block(current) {
                return Some(found);
            }
            child = self.block(current).ok()?.previous;
        }
        None
    }

    /// All attached content blocks in document order.
    pub fn content_blocks(&self) -> Vec<BlockId> {
        let mut blocks = Vec::new();
        let mut current = self.first_content_block(self.root);
        while let Some(block) = current {
            blocks.push(block);
            current = self.get_block_to(Direction::Forward, block);
        }
        blocks
    }

    /// The content block a caret reaches when it leaves `block` in
    /// `direction`: the nearest sibling (climbing out of collections as
    /// needed), descended into its first or last content block. `Top` and
    /// `Bottom` only differ from `Backward` and `Forward` in how the caller
    /// places the caret inside the block found.
    pub fn get_block_to(&self, direction: Direction, block: BlockId) -> Option<BlockId> {
        let mut current = block;
        loop {
            let node = self.block(current).ok()?;
            let sibling = if direction.is_downstream() {
                node.next
            } else {
                node.previous
            };
            match sibling {
                Some(sibling) => {
                    let found = if direction.is_downstream() {
                        self.first_content_block(sibling)
                    } else {
                        self.last_content_block(sibling)
                    };
                    match found {
                        Some(found) => return Some(found),
                        None => current = sibling,
                    }
                }
                None => {
                    current = node.parent?;
                    if current == self.root {
                        return None;
                    }
                }
            }
        }
    }

    // ---- structural mutation -------------------------------------------

    /// Appends a detached block as the last child of `parent`.
    pub fn append(&mut self, parent: BlockId, new: BlockId) -> Result<(), DocumentError> {
        self.ensure_collection(parent)?;
        self.ensure_insertable(parent, new)?;
        let last = self.block(parent)?.last_child();
        self.link_after(parent, last, new);
        self.structure_changed();
        self.notify_inserted(parent, new);
        Ok(())
    }

    pub fn insert_block_after(
        &mut self,
        reference: BlockId,
        new: BlockId,
    ) -> Result<(), DocumentError> {
        let parent = self.ensure_child(reference)?;
        self.ensure_insertable(parent, new)?;
        self.link_after(parent, Some(reference), new);
        self.structure_changed();
        self.notify_inserted(parent, new);
        Ok(())
    }

    pub fn insert_block_before(
        &mut self,
        reference: BlockId,
        new: BlockId,
    ) -> Result<(), DocumentError> {
        let parent = self.ensure_child(reference)?;
        self.ensure_insertable(parent, new)?;
        let previous = self.block(reference)?.previous;
        self.link_after(parent, previous, new);
        self.structure_changed();
        self.notify_inserted(parent, new);
        Ok(())
    }

    /// Puts `new` where `old` was and destroys `old`.
    pub fn replace(&mut self, old: BlockId, new: BlockId) -> Result<(), DocumentError> {
        let parent = self.ensure_child(old)?;
        self.ensure_insertable(parent, new)?;
        let index = self.index_of(old)?;
        let previous = self.block(old)?.previous;
        self.unlink(old)?;
        self.notify_removed(parent, old, index);
        self.free_subtree(old);
        self.link_after(parent, previous, new);
        self.structure_changed();
        self.notify_inserted(parent, new);
        Ok(())
    }

    /// Detaches and destroys `block` with its subtree.
    pub fn remove_block(&mut self, block: BlockId) -> Result<(), DocumentError> {
        let parent = self.ensure_child(block)?;
        if self.block(parent)?.child_count() <= 1 {
            return Err(DocumentError::LastChild(block));
        }
        let index = self.index_of(block)?;
        self.unlink(block)?;
        self.free_subtree(block);
        self.structure_changed();
        self.notify_removed(parent, block, index);
        Ok(())
    }

    /// Links a detached block after `previous` (or first when `None`).
    pub(crate) fn link_after(&mut self, parent: BlockId, previous: Option<BlockId>, new: BlockId) {
        let next = match previous {
            Some(previous) => self.block(previous).ok().and_then(|b| b.next),
            None => self.block(parent).ok().and_then(Block::first_child),
        };

        if let Ok(block) = self.block_mut(new) {
            block.parent = Some(parent);
            block.previous = previous;
            block.next = next;
        }
        if let Some(previous) = previous
            && let Ok(block) = self.block_mut(previous)
        {
            block.next = Some(new);
        }
        if let Some(next) = next
            && let Ok(block) = self.block_mut(next)
        {
            block.previous = Some(new);
        }
        if let Ok(block) = self.block_mut(parent)
            && let BlockData::Collection { first, last, count } = &mut block.data
        {
            if previous.is_none() {
                *first = Some(new);
            }
            if next.is_none() {
                *last = Some(new);
            }
            *count += 1;
        }
        trace!("linked {new} under {parent}");
    }

    fn unlink(&mut self, id: BlockId) -> Result<(), DocumentError> {
        let (parent, previous, next) = {
            let block = self.block(id)?;
            (
                block.parent.ok_or(DocumentError::NotAttached(id))?,
                block.previous,
                block.next,
            )
        };

        if let Some(previous) = previous {
            self.block_mut(previous)?.next = next;
        }
        if let Some(next) = next {
            self.block_mut(next)?.previous = previous;
        }
        if let BlockData::Collection { first, last, count } = &mut self.block_mut(parent)?.data {
            if previous.is_none() {
                *first = next;
            }
            if next.is_none() {
                *last = previous;
            }
            *count -= 1;
        }
        let block = self.block_mut(id)?;
        block.parent = None;
        block.previous = None;
        block.next = None;
        trace!("unlinked {id} from {parent}");
        Ok(())
    }

    fn ensure_collection(&self, id: BlockId) -> Result<(), DocumentError> {
        if self.block(id)?.is_collection() {
            Ok(())
        } else {
            Err(DocumentError::NotACollection(id))
        }
    }

    /// Returns the parent of an attached, non-root block.
    fn ensure_child(&self, id: BlockId) -> Result<BlockId, DocumentError> {
        if id == self.root {
            return Err(DocumentError::RootBlock);
        }
        self.block(id)?
            .parent
            .ok_or(DocumentError::NotAttached(id))
    }

    fn ensure_detached(&self, id: BlockId) -> Result<(), DocumentError> {
        if id == self.root {
            return Err(DocumentError::RootBlock);
        }
        if self.block(id)?.parent.is_some() {
            return Err(DocumentError::AlreadyAttached(id));
        }
        Ok(())
    }

    fn ensure_insertable(&self, parent: BlockId, new: BlockId) -> Result<(), DocumentError> {
        self.ensure_detached(new)?;
        let mut current = Some(parent);
        while let Some(ancestor) = current {
            if ancestor == new {
                return Err(DocumentError::Cycle { parent, block: new });
            }
            current = self.block(ancestor)?.parent;
        }
        Ok(())
    }

    fn structure_changed(&mut self) {
        self.revision += 1;
        self.structure_revision += 1;
    }

    fn notify_inserted(&mut self, parent: BlockId, block: BlockId) {
        if self.observers.is_empty() {
            return;
        }
        let Ok(index) = self.index_of(block) else {
            return;
        };
        let event = BlockEvent {
            parent,
            block,
            index,
        };
        for observer in &mut self.observers {
            observer.block_inserted(&event);
        }
    }

    fn notify_removed(&mut self, parent: BlockId, block: BlockId, index: usize) {
        let event = BlockEvent {
            parent,
            block,
            index,
        };
        for observer in &mut self.observers {
            observer.block_removed(&event);
        }
    }

    // ---- copies and comparison -----------------------------------------

    /// Deep, detached copy of a subtree. Text fragments are recreated.
    pub fn clone_subtree(&mut self, id: BlockId) -> Result<BlockId, DocumentError> {
        let source = self.block(id)?;
        let data = match &source.data {
            BlockData::Collection { .. } => BlockData::empty_collection(),
            BlockData::Text(content) => BlockData::Text(content.deep_clone()),
        };
        let copy = Block::new(source.descriptor, source.attributes.clone(), data);
        let children: Vec<BlockId> = self.children(id).collect();

        let copy = self.alloc(copy);
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            let last = self.block(copy)?.last_child();
            self.link_after(copy, last, child_copy);
        }
        Ok(copy)
    }

    /// Structural equality of two subtrees, possibly in different
    /// documents.
    pub fn subtree_eq(&self, a: BlockId, other: &Document, b: BlockId) -> bool {
        let (Ok(left), Ok(right)) = (self.block(a), other.block(b)) else {
            return false;
        };
        if left.descriptor != right.descriptor || left.attributes != right.attributes {
            return false;
        }
        match (&left.data, &right.data) {
            (BlockData::Text(x), BlockData::Text(y)) => x == y,
            (BlockData::Collection { count: x, .. }, BlockData::Collection { count: y, .. }) => {
                x == y
                    && self
                        .children(a)
                        .zip(other.children(b))
                        .all(|(l, r)| self.subtree_eq(l, other, r))
            }
            _ => false,
        }
    }
}

/// Iterator over the children of a collection.
pub struct Children<'a> {
    document: &'a Document,
    next: Option<BlockId>,
}

impl Iterator for Children<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let current = self.next?;
        self.next = self.document.block(current).ok().and_then(Block::next_block);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::ids;
    use crate::tests::{RecordingObserver, document_with_paragraphs, texts};
    use pretty_assertions::assert_eq;

    #[test]
    fn new_document_has_one_empty_paragraph() {
        let doc = Document::new();
        assert_eq!(doc.child_count(doc.root()).unwrap(), 1);
        let first = doc.first_block(doc.root()).unwrap().unwrap();
        assert_eq!(doc.block(first).unwrap().descriptor_id(), ids::PARAGRAPH);
        assert_eq!(doc.text(first).unwrap(), "");
    }

    #[test]
    fn insert_before_and_after_keep_links_consistent() {
        let mut doc = document_with_paragraphs(&["b"]);
        let b = doc.first_block(doc.root()).unwrap().unwrap();

        let a = doc.create_text_block(ids::PARAGRAPH, "a".into()).unwrap();
        doc.insert_block_before(b, a).unwrap();
        let c = doc.create_text_block(ids::PARAGRAPH, "c".into()).unwrap();
        doc.insert_block_after(b, c).unwrap();

        assert_eq!(texts(&doc), vec!["a", "b", "c"]);
        assert_eq!(doc.block(a).unwrap().next_block(), Some(b));
        assert_eq!(doc.block(c).unwrap().previous_block(), Some(b));
        assert_eq!(doc.last_block(doc.root()).unwrap(), Some(c));
        assert_eq!(doc.index_of(c).unwrap(), 2);
        for child in doc.children(doc.root()) {
            assert_eq!(doc.block(child).unwrap().parent(), Some(doc.root()));
        }
    }

    #[test]
    fn replace_destroys_old_block() {
        let mut doc = document_with_paragraphs(&["a", "b"]);
        let a = doc.first_block(doc.root()).unwrap().unwrap();
        let heading = doc.create_text_block(ids::HEADING, "A".into()).unwrap();

        doc.replace(a, heading).unwrap();

        assert!(!doc.contains(a));
        assert_eq!(texts(&doc), vec!["A", "b"]);
        assert_eq!(doc.first_block(doc.root()).unwrap(), Some(heading));
    }

    #[test]
    fn removing_last_child_is_rejected() {
        let mut doc = Document::new();
        let only = doc.first_block(doc.root()).unwrap().unwrap();
        assert_eq!(doc.remove_block(only), Err(DocumentError::LastChild(only)));
    }

    #[test]
    fn removed_ids_go_stale_even_when_slot_is_reused() {
        let mut doc = document_with_paragraphs(&["a", "b"]);
        let a = doc.first_block(doc.root()).unwrap().unwrap();
        doc.remove_block(a).unwrap();

        let fresh = doc.create_block(ids::PARAGRAPH).unwrap();
        assert_eq!(fresh.index, a.index);
        assert!(matches!(doc.block(a), Err(DocumentError::UnknownBlock(_))));
    }

    #[test]
    fn attached_blocks_cannot_be_inserted_twice() {
        let mut doc = document_with_paragraphs(&["a", "b"]);
        let a = doc.first_block(doc.root()).unwrap().unwrap();
        let b = doc.last_block(doc.root()).unwrap().unwrap();
        assert_eq!(
            doc.insert_block_after(b, a),
            Err(DocumentError::AlreadyAttached(a))
        );
    }

    #[test]
    fn collection_cannot_be_appended_below_itself() {
        let mut doc = Document::new();
        let quote = doc.create_block(ids::QUOTE).unwrap();
        let nested = doc.create_block(ids::QUOTE).unwrap();
        doc.append(quote, nested).unwrap();

        assert_eq!(
            doc.append(nested, quote),
            Err(DocumentError::Cycle {
                parent: nested,
                block: quote
            })
        );
        let paragraph = doc.first_block(quote).unwrap().unwrap();
        assert_eq!(
            doc.append(paragraph, quote),
            Err(DocumentError::NotACollection(paragraph))
        );
    }

    #[test]
    fn get_block_to_escapes_and_descends_collections() {
        let mut doc = document_with_paragraphs(&["before", "after"]);
        let before = doc.first_block(doc.root()).unwrap().unwrap();
        let quote = doc.create_block(ids::QUOTE).unwrap();
        let quoted = doc.first_block(quote).unwrap().unwrap();
        doc.set_text(quoted, "quoted").unwrap();
        doc.insert_block_after(before, quote).unwrap();
        let after = doc.last_block(doc.root()).unwrap().unwrap();

        assert_eq!(doc.get_block_to(Direction::Forward, before), Some(quoted));
        assert_eq!(doc.get_block_to(Direction::Bottom, quoted), Some(after));
        assert_eq!(doc.get_block_to(Direction::Backward, after), Some(quoted));
        assert_eq!(doc.get_block_to(Direction::Top, quoted), Some(before));
        assert_eq!(doc.get_block_to(Direction::Backward, before), None);
        assert_eq!(doc.get_block_to(Direction::Forward, after), None);
        assert_eq!(doc.content_blocks(), vec![before, quoted, after]);
    }

    #[test]
    fn vertical_directions_reach_the_adjacent_block() {
        let mut doc = document_with_paragraphs(&["one", "two", "three"]);
        let quote = doc.create_block(ids::QUOTE).unwrap();
        doc.append(doc.root(), quote).unwrap();
        let blocks = doc.content_blocks();

        for &block in &blocks {
            assert_eq!(
                doc.get_block_to(Direction::Top, block),
                doc.get_block_to(Direction::Backward, block)
            );
            assert_eq!(
                doc.get_block_to(Direction::Bottom, block),
                doc.get_block_to(Direction::Forward, block)
            );
        }
        assert_eq!(doc.get_block_to(Direction::Top, blocks[2]), Some(blocks[1]));
        assert_eq!(doc.get_block_to(Direction::Bottom, blocks[1]), Some(blocks[2]));
        assert_eq!(doc.get_block_to(Direction::Top, blocks[0]), None);
        assert_eq!(doc.get_block_to(Direction::Bottom, blocks[3]), None);
    }

    #[test]
    fn text_access_with_bad_ids_leaves_revision_alone() {
        let mut doc = document_with_paragraphs(&["a", "b"]);
        let stale = doc.content_blocks()[1];
        doc.remove_block(stale).unwrap();
        let root = doc.root();
        let revision = doc.revision();

        assert_eq!(
            doc.text_content_mut(stale).err(),
            Some(DocumentError::UnknownBlock(stale))
        );
        assert_eq!(
            doc.text_content_mut(root).err(),
            Some(DocumentError::NotATextBlock(root))
        );
        assert!(doc.set_text(root, "x").is_err());
        assert_eq!(doc.revision(), revision);

        let live = doc.content_blocks()[0];
        doc.text_content_mut(live).unwrap();
        assert_eq!(doc.revision(), revision + 1);
    }

    #[test]
    fn observers_see_inserts_and_removals() {
        let mut doc = document_with_paragraphs(&["a"]);
        let (observer, events) = RecordingObserver::new();
        doc.add_observer(Box::new(observer));
        let a = doc.first_block(doc.root()).unwrap().unwrap();

        let b = doc.create_block(ids::PARAGRAPH).unwrap();
        doc.insert_block_after(a, b).unwrap();
        doc.remove_block(a).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![format!("+{b}@1"), format!("-{a}@0")]
        );
    }

    #[test]
    fn clone_subtree_is_structurally_equal_but_independent() {
        let mut doc = Document::new();
        let quote = doc.create_block(ids::QUOTE).unwrap();
        let inner = doc.first_block(quote).unwrap().unwrap();
        doc.set_text(inner, "quoted").unwrap();

        let copy = doc.clone_subtree(quote).unwrap();
        assert!(doc.subtree_eq(quote, &doc, copy));

        doc.set_text(inner, "changed").unwrap();
        assert!(!doc.subtree_eq(quote, &doc, copy));
    }

    #[test]
    fn cloned_document_compares_equal_under_new_id() {
        let doc = document_with_paragraphs(&["one", "two"]);
        let copy = doc.clone();
        assert_ne!(doc.id(), copy.id());
        assert_eq!(doc, copy);
    }

    #[test]
    fn structural_mutations_bump_structure_revision() {
        let mut doc = Document::new();
        let first = doc.first_block(doc.root()).unwrap().unwrap();
        let before = doc.structure_revision();

        doc.text_content_mut(first).unwrap();
        assert_eq!(doc.structure_revision(), before);

        let block = doc.create_block(ids::PARAGRAPH).unwrap();
        doc.append(doc.root(), block).unwrap();
        assert_eq!(doc.structure_revision(), before + 1);
    }
}
