use super::{BlockCaret, CaretError, SimpleCaret, SimpleCaretMover};
use crate::blocks::{BlockId, Document};
use crate::text::TextOffset;

/// A grapheme boundary inside a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextCaret {
    pub block: BlockId,
    pub offset: TextOffset,
}

pub static TEXT_CARET_MOVER: SimpleCaretMover<TextCaret> = SimpleCaretMover::new("text");

impl TextCaret {
    pub fn new(block: BlockId, offset: TextOffset) -> Self {
        Self { block, offset }
    }

    pub fn at_start(document: &Document, block: BlockId) -> Result<Self, CaretError> {
        let content = document.text_content(block)?;
        Ok(Self::new(block, content.caret_at_start()))
    }

    pub fn at_end(document: &Document, block: BlockId) -> Result<Self, CaretError> {
        let content = document.text_content(block)?;
        Ok(Self::new(block, content.caret_at_end()))
    }

    pub fn from_grapheme_index(
        document: &Document,
        block: BlockId,
        index: usize,
    ) -> Result<Self, CaretError> {
        let content = document.text_content(block)?;
        content
            .offset_from_grapheme_index(index)
            .map(|offset| Self::new(block, offset))
            .ok_or(CaretError::OffsetOutOfRange {
                offset: index,
                len: content.grapheme_len(),
            })
    }

    /// The caret with its offset re-derived from the current content.
    pub fn resolve(&self, document: &Document) -> Result<Self, CaretError> {
        let offset = document.text_content(self.block)?.resolve(self.offset)?;
        Ok(Self::new(self.block, offset))
    }

    pub fn grapheme_index(&self) -> usize {
        self.offset.grapheme_offset
    }

    pub fn byte_offset(&self) -> usize {
        self.offset.byte_offset
    }
}

impl SimpleCaret for TextCaret {
    fn mover() -> &'static SimpleCaretMover<Self> {
        &TEXT_CARET_MOVER
    }

    fn block(&self) -> BlockId {
        self.block
    }

    fn next_position(&self, document: &Document) -> Result<Option<Self>, CaretError> {
        let content = document.text_content(self.block)?;
        let current = content.resolve(self.offset)?;
        Ok(content
            .next_offset(current)
            .map(|offset| Self::new(self.block, offset)))
    }

    fn previous_position(&self, document: &Document) -> Result<Option<Self>, CaretError> {
        let content = document.text_content(self.block)?;
        let current = content.resolve(self.offset)?;
        Ok(content
            .previous_offset(current)
            .map(|offset| Self::new(self.block, offset)))
    }

    fn is_valid(&self, document: &Document) -> bool {
        document
            .text_content(self.block)
            .is_ok_and(|content| content.resolve(self.offset).is_ok())
    }

    fn position(&self, document: &Document) -> Result<usize, CaretError> {
        Ok(self.resolve(document)?.offset.grapheme_offset)
    }

    fn from_position(
        document: &Document,
        block: BlockId,
        position: usize,
    ) -> Result<Self, CaretError> {
        Self::from_grapheme_index(document, block, position)
    }

    fn to_slots(&self) -> [usize; 4] {
        [
            self.offset.byte_offset,
            self.offset.grapheme_offset,
            self.offset.grapheme_len,
            0,
        ]
    }

    fn from_slots(block: BlockId, slots: [usize; 4]) -> Self {
        Self::new(block, TextOffset::new(slots[0], slots[1], slots[2]))
    }
}

impl From<TextCaret> for BlockCaret {
    fn from(caret: TextCaret) -> Self {
        caret.into_block_caret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::document_with_paragraphs;
    use pretty_assertions::assert_eq;

    #[test]
    fn walks_every_boundary_then_becomes_invalid() {
        let doc = document_with_paragraphs(&["ab"]);
        let block = doc.content_blocks()[0];
        let mut caret: BlockCaret = TextCaret::at_start(&doc, block).unwrap().into();
        let mut seen = Vec::new();
        while !caret.is_invalid() {
            seen.push(caret.downcast::<TextCaret>().unwrap().grapheme_index());
            caret = caret.move_forward(&doc).unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn edges_are_reported_without_errors() {
        let doc = document_with_paragraphs(&["ab"]);
        let block = doc.content_blocks()[0];
        let start: BlockCaret = TextCaret::at_start(&doc, block).unwrap().into();
        let end: BlockCaret = TextCaret::at_end(&doc, block).unwrap().into();

        assert!(start.is_at_block_start(&doc).unwrap());
        assert!(!start.is_at_block_end(&doc).unwrap());
        assert!(end.is_at_block_end(&doc).unwrap());
        assert!(start.move_backward(&doc).unwrap().is_invalid());
        assert!(end.move_forward(&doc).unwrap().is_invalid());
    }

    #[test]
    fn empty_block_start_is_also_its_end() {
        let doc = document_with_paragraphs(&[""]);
        let block = doc.content_blocks()[0];
        let start: BlockCaret = TextCaret::at_start(&doc, block).unwrap().into();
        assert!(start.is_at_block_start(&doc).unwrap());
        assert!(start.is_at_block_end(&doc).unwrap());
    }

    #[test]
    fn clusters_are_single_steps() {
        let doc = document_with_paragraphs(&["e\u{0301}\u{1F469}\u{200D}\u{1F4BB}!"]);
        let block = doc.content_blocks()[0];
        let caret: BlockCaret = TextCaret::at_start(&doc, block).unwrap().into();
        let one = caret.move_forward(&doc).unwrap().downcast::<TextCaret>().unwrap();
        let two = BlockCaret::from(one)
            .move_forward(&doc)
            .unwrap()
            .downcast::<TextCaret>()
            .unwrap();
        assert_eq!(one.byte_offset(), 3);
        assert_eq!(two.byte_offset(), 14);
        assert_eq!(two.grapheme_index(), 2);
    }

    #[test]
    fn grapheme_index_past_end_is_rejected() {
        let doc = document_with_paragraphs(&["ab"]);
        let block = doc.content_blocks()[0];
        assert_eq!(
            TextCaret::from_grapheme_index(&doc, block, 3),
            Err(CaretError::OffsetOutOfRange { offset: 3, len: 2 })
        );
    }

    #[test]
    fn equal_offsets_in_different_blocks_differ() {
        let doc = document_with_paragraphs(&["ab", "ab"]);
        let blocks = doc.content_blocks();
        let a = TextCaret::at_start(&doc, blocks[0]).unwrap();
        let b = TextCaret::at_start(&doc, blocks[1]).unwrap();
        assert_ne!(a, b);
        assert_ne!(BlockCaret::from(a), BlockCaret::from(b));
    }
}
