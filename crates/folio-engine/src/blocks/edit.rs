use std::collections::BTreeMap;

use super::block::{Block, BlockData};
use super::descriptor::BlockCategory;
use super::{BlockId, Document, DocumentError};
use crate::caret::{BlockCaret, CaretError, TextCaret};
use crate::text::{TextBlockContent, TextOffset};

/// Where a text block was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakKind {
    /// Caret at the start: an empty block was inserted before.
    AtStart,
    /// Caret at the end: an empty block was inserted after.
    AtEnd,
    /// The tail of the block moved into a new block after it.
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakOutcome {
    pub kind: BreakKind,
    pub new_block: BlockId,
    /// Where the caret lands after the break.
    pub caret: TextCaret,
}

impl Document {
    /// Splits the text block under `caret`. Returns `None` for block types
    /// that cannot be split.
    pub fn break_text_block(
        &mut self,
        caret: TextCaret,
    ) -> Result<Option<BreakOutcome>, DocumentError> {
        let block = caret.block;
        let source = self.block(block)?;
        if source.parent.is_none() {
            return Err(DocumentError::NotAttached(block));
        }
        if !self.registry().get(source.descriptor)?.splittable {
            return Ok(None);
        }
        let content = self.text_content(block)?;
        let offset = content.resolve(caret.offset)?;
        let start = content.caret_at_start();

        let outcome = if offset.is_end() {
            let new_block = self.create_sibling(block, TextBlockContent::new())?;
            self.insert_block_after(block, new_block)?;
            BreakOutcome {
                kind: BreakKind::AtEnd,
                new_block,
                caret: TextCaret::new(new_block, TextOffset::default()),
            }
        } else if offset == start {
            let new_block = self.create_sibling(block, TextBlockContent::new())?;
            self.insert_block_before(block, new_block)?;
            BreakOutcome {
                kind: BreakKind::AtStart,
                new_block,
                caret: TextCaret::new(block, offset),
            }
        } else {
            let end = content.caret_at_end();
            let tail = self.text_content_mut(block)?.extract_content(offset, end)?;
            let new_block = self.create_sibling(block, tail)?;
            self.insert_block_after(block, new_block)?;
            BreakOutcome {
                kind: BreakKind::Middle,
                new_block,
                caret: TextCaret::new(new_block, self.text_content(new_block)?.caret_at_start()),
            }
        };
        Ok(Some(outcome))
    }

    /// Type-erased break: [`BlockCaret::INVALID`] when the caret's block
    /// cannot be split.
    pub fn try_break_block(&mut self, caret: BlockCaret) -> Result<BlockCaret, CaretError> {
        if caret.is_invalid() {
            return Err(CaretError::Invalid);
        }
        let Some(text) = caret.try_downcast::<TextCaret>() else {
            return Ok(BlockCaret::INVALID);
        };
        Ok(self
            .break_text_block(text)?
            .map_or(BlockCaret::INVALID, |outcome| outcome.caret.into()))
    }

    /// Moves the whole content of `block` onto the end of its previous
    /// sibling and removes `block`. `None` when `block` is first or either
    /// side is not a text block. The returned caret sits at the join.
    pub fn merge_with_previous(
        &mut self,
        block: BlockId,
    ) -> Result<Option<TextCaret>, DocumentError> {
        let source = self.block(block)?;
        if source.parent.is_none() {
            return Err(DocumentError::NotAttached(block));
        }
        let Some(previous) = source.previous else {
            return Ok(None);
        };
        if source.category() != BlockCategory::Text
            || self.block(previous)?.category() != BlockCategory::Text
        {
            return Ok(None);
        }

        let join = self.text_content(previous)?.byte_len();
        let content = std::mem::take(self.text_content_mut(block)?);
        let target = self.text_content_mut(previous)?;
        target.append_content(content);
        let caret = TextCaret::new(previous, target.offset_from_byte(join));
        self.remove_block(block)?;
        Ok(Some(caret))
    }

    /// Replaces a text block by a block of another text type, keeping its
    /// content. Returns the id of the new block.
    pub fn convert_block(
        &mut self,
        block: BlockId,
        descriptor_id: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<BlockId, DocumentError> {
        let source = self.block(block)?;
        let target = self.registry().get(descriptor_id)?;
        if source.category() != BlockCategory::Text || target.category != BlockCategory::Text {
            return Err(DocumentError::IncompatibleConversion {
                from: source.descriptor.to_string(),
                to: descriptor_id.to_string(),
            });
        }
        if source.parent.is_none() {
            return Err(DocumentError::NotAttached(block));
        }

        let new_block = self.create_block_with(descriptor_id, attributes)?;
        let content = std::mem::take(self.text_content_mut(block)?);
        self.set_text_content(new_block, content)?;
        self.replace(block, new_block)?;
        Ok(new_block)
    }

    /// A detached block of the same type and attributes as `block`.
    fn create_sibling(
        &mut self,
        block: BlockId,
        content: TextBlockContent,
    ) -> Result<BlockId, DocumentError> {
        let source = self.block(block)?;
        let sibling = Block::new(
            source.descriptor,
            source.attributes.clone(),
            BlockData::Text(content),
        );
        Ok(self.alloc(sibling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::ids;
    use crate::tests::{document_with_paragraphs, texts};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn caret_at(doc: &Document, block: BlockId, index: usize) -> TextCaret {
        TextCaret::from_grapheme_index(doc, block, index).unwrap()
    }

    #[test]
    fn break_at_end_adds_empty_block_after() {
        let mut doc = document_with_paragraphs(&["Paragraph 1"]);
        let block = doc.content_blocks()[0];
        let end = TextCaret::at_end(&doc, block).unwrap();

        let outcome = doc.break_text_block(end).unwrap().unwrap();

        assert_eq!(outcome.kind, BreakKind::AtEnd);
        assert_eq!(texts(&doc), vec!["Paragraph 1", ""]);
        assert_eq!(outcome.caret.block, outcome.new_block);
        assert_eq!(doc.index_of(outcome.new_block).unwrap(), 1);
    }

    #[test]
    fn break_at_start_adds_empty_block_before() {
        let mut doc = document_with_paragraphs(&["text"]);
        let block = doc.content_blocks()[0];
        let outcome = doc
            .break_text_block(caret_at(&doc, block, 0))
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, BreakKind::AtStart);
        assert_eq!(texts(&doc), vec!["", "text"]);
        assert_eq!(outcome.caret, caret_at(&doc, block, 0));
    }

    #[test]
    fn break_keeps_type_and_attributes() {
        let mut doc = Document::new();
        let heading = doc.create_text_block(ids::HEADING, "Title".into()).unwrap();
        doc.set_attribute(heading, "level", "3").unwrap();
        let first = doc.content_blocks()[0];
        doc.replace(first, heading).unwrap();

        let outcome = doc
            .break_text_block(caret_at(&doc, heading, 2))
            .unwrap()
            .unwrap();
        let new_block = doc.block(outcome.new_block).unwrap();
        assert_eq!(new_block.descriptor_id(), ids::HEADING);
        assert_eq!(new_block.attribute("level"), Some("3"));
        assert_eq!(texts(&doc), vec!["Ti", "tle"]);
    }

    #[test]
    fn code_blocks_do_not_break() {
        let mut doc = Document::new();
        let code = doc.create_text_block(ids::CODE, "let x;".into()).unwrap();
        let first = doc.content_blocks()[0];
        doc.replace(first, code).unwrap();

        let caret: BlockCaret = caret_at(&doc, code, 3).into();
        assert!(doc.try_break_block(caret).unwrap().is_invalid());
        assert_eq!(texts(&doc), vec!["let x;"]);
    }

    #[rstest]
    fn break_then_merge_restores_text(#[values(0, 1, 3, 6, 7)] split: usize) {
        let mut doc = document_with_paragraphs(&["TheWord"]);
        let block = doc.content_blocks()[0];

        let caret = doc
            .try_break_block(caret_at(&doc, block, split).into())
            .unwrap();
        assert!(!caret.is_invalid());
        assert_eq!(doc.child_count(doc.root()).unwrap(), 2);

        let second = doc.content_blocks()[1];
        doc.merge_with_previous(second).unwrap().unwrap();

        assert_eq!(texts(&doc), vec!["TheWord"]);
    }

    #[test]
    fn merge_places_caret_at_join() {
        let mut doc = document_with_paragraphs(&["Paragraph 1", "Paragraph 2"]);
        let blocks = doc.content_blocks();

        let caret = doc.merge_with_previous(blocks[1]).unwrap().unwrap();

        assert_eq!(texts(&doc), vec!["Paragraph 1Paragraph 2"]);
        assert_eq!(caret.block, blocks[0]);
        assert_eq!(caret.grapheme_index(), 11);
        assert!(!doc.contains(blocks[1]));
    }

    #[test]
    fn first_block_has_nothing_to_merge_with() {
        let mut doc = document_with_paragraphs(&["a", "b"]);
        let first = doc.content_blocks()[0];
        assert_eq!(doc.merge_with_previous(first).unwrap(), None);
    }

    #[test]
    fn merge_after_collection_is_refused() {
        let mut doc = document_with_paragraphs(&["a"]);
        let quote = doc.create_block(ids::QUOTE).unwrap();
        let first = doc.content_blocks()[0];
        doc.insert_block_before(first, quote).unwrap();
        assert_eq!(doc.merge_with_previous(first).unwrap(), None);
    }

    #[test]
    fn convert_keeps_content_and_position() {
        let mut doc = document_with_paragraphs(&["a", "Title"]);
        let paragraph = doc.content_blocks()[1];
        let attributes = BTreeMap::from([("level".to_string(), "2".to_string())]);

        let heading = doc.convert_block(paragraph, ids::HEADING, &attributes).unwrap();

        assert_eq!(doc.index_of(heading).unwrap(), 1);
        assert_eq!(doc.text(heading).unwrap(), "Title");
        assert_eq!(doc.block(heading).unwrap().attribute("level"), Some("2"));
        assert!(!doc.contains(paragraph));
    }

    #[test]
    fn convert_into_collection_is_rejected() {
        let mut doc = document_with_paragraphs(&["a"]);
        let paragraph = doc.content_blocks()[0];
        assert_eq!(
            doc.convert_block(paragraph, ids::QUOTE, &BTreeMap::new()),
            Err(DocumentError::IncompatibleConversion {
                from: "paragraph".to_string(),
                to: "quote".to_string()
            })
        );
    }
}
