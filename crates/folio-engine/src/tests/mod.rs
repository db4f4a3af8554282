//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use tempfile::TempDir;

use crate::blocks::{BlockEvent, BlockId, BlockTreeObserver, Document, ids};
use crate::caret::{BlockCaret, CaretError, DocumentCursorHandle, TextCaret};
use crate::commands::EditorContext;
use crate::editing::ActionStack;
use crate::text::TextBlockContent;
use crate::view::{CaretMovementMode, ContentBlockView, SelectionBounds};

/// Create a temporary directory for documents
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test file with content
pub fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// A document whose root holds exactly one paragraph per entry.
pub fn document_with_paragraphs(paragraphs: &[&str]) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    let placeholder = doc.first_block(root).unwrap().unwrap();
    for text in paragraphs {
        let block = doc
            .create_text_block(ids::PARAGRAPH, TextBlockContent::from_text(text))
            .unwrap();
        doc.append(root, block).unwrap();
    }
    if !paragraphs.is_empty() {
        doc.remove_block(placeholder).unwrap();
    }
    doc
}

/// Text of every content block in document order.
pub fn texts(doc: &Document) -> Vec<String> {
    doc.content_blocks()
        .into_iter()
        .map(|block| doc.text(block).unwrap())
        .collect()
}

pub fn handle_at(doc: &Document, block: BlockId, grapheme_index: usize) -> DocumentCursorHandle {
    let caret = TextCaret::from_grapheme_index(doc, block, grapheme_index).unwrap();
    DocumentCursorHandle::for_text(doc, caret).unwrap()
}

/// Editor state over [`document_with_paragraphs`] with a fresh stack.
pub fn context_with_paragraphs(paragraphs: &[&str]) -> (EditorContext, ActionStack) {
    let context = EditorContext::new(document_with_paragraphs(paragraphs)).unwrap();
    (context, ActionStack::new())
}

/// Records tree events as `+block@index` / `-block@index`.
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<String>>>,
}

impl RecordingObserver {
    pub fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                events: Rc::clone(&events),
            },
            events,
        )
    }
}

impl BlockTreeObserver for RecordingObserver {
    fn block_inserted(&mut self, event: &BlockEvent) {
        self.events
            .borrow_mut()
            .push(format!("+{}@{}", event.block, event.index));
    }

    fn block_removed(&mut self, event: &BlockEvent) {
        self.events
            .borrow_mut()
            .push(format!("-{}@{}", event.block, event.index));
    }
}

/// Lays every content block out on a single line, one column per grapheme.
pub struct LineView;

impl LineView {
    fn column(document: &Document, block: BlockId, mode: CaretMovementMode) -> usize {
        let len = document.text_content(block).unwrap().grapheme_len();
        match mode {
            CaretMovementMode::Position(x) => (x.max(0.0) as usize).min(len),
            CaretMovementMode::None | CaretMovementMode::Home => 0,
            CaretMovementMode::End => len,
        }
    }

    fn caret_at(
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        let column = Self::column(document, block, mode);
        Ok(TextCaret::from_grapheme_index(document, block, column)?.into())
    }
}

impl ContentBlockView for LineView {
    fn measure_selection_bounds(
        &self,
        document: &Document,
        start: BlockCaret,
        end: BlockCaret,
    ) -> Result<SelectionBounds, CaretError> {
        let start = start.downcast::<TextCaret>()?;
        let end = end.downcast::<TextCaret>()?;
        let line = document
            .content_blocks()
            .iter()
            .position(|&block| block == start.block)
            .unwrap_or_default();
        Ok(SelectionBounds {
            x: start.grapheme_index() as f32,
            y: line as f32,
            width: end.grapheme_index().saturating_sub(start.grapheme_index()) as f32,
            height: 1.0,
        })
    }

    fn caret_from_top(
        &self,
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        Self::caret_at(document, block, mode)
    }

    fn caret_from_bottom(
        &self,
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        Self::caret_at(document, block, mode)
    }
}
