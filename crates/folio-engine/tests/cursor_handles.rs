use folio_engine::blocks::ids;
use folio_engine::caret::{DocumentCursorHandle, TextCaret};
use folio_engine::editing::{ActionStack, MergeTextBlocksAction, RemoveBlockAction};
use folio_engine::{CaretError, Document, document_from_text};
use pretty_assertions::assert_eq;

fn handle_in(doc: &Document, index: usize, grapheme: usize) -> DocumentCursorHandle {
    let block = doc.content_blocks()[index];
    let caret = TextCaret::from_grapheme_index(doc, block, grapheme).unwrap();
    DocumentCursorHandle::for_text(doc, caret).unwrap()
}

#[test]
fn handle_survives_removal_and_restore_of_its_block() {
    let mut doc = document_from_text("one\ntwo\nthree").unwrap();
    let mut stack = ActionStack::new();
    let on_two = handle_in(&doc, 1, 2);
    let path = on_two.path().clone();

    stack
        .do_action(&mut doc, Box::new(RemoveBlockAction::new(path)))
        .unwrap();
    // The path now points at "three".
    let caret = on_two.resolve_text(&doc).unwrap();
    assert_eq!(doc.text(caret.block).unwrap(), "three");

    stack.undo(&mut doc).unwrap();
    let caret = on_two.resolve_text(&doc).unwrap();
    assert_eq!(doc.text(caret.block).unwrap(), "two");
    assert_eq!(caret.grapheme_index(), 2);
}

#[test]
fn handle_past_the_end_after_merge_undo_is_rejected_then_valid() {
    let mut doc = document_from_text("ab\ncdef").unwrap();
    let mut stack = ActionStack::new();
    let deep = handle_in(&doc, 1, 4);

    let path = deep.path().clone();
    stack
        .do_action(&mut doc, Box::new(MergeTextBlocksAction::new(path)))
        .unwrap();
    assert!(deep.resolve(&doc).is_err());

    stack.undo(&mut doc).unwrap();
    let caret = deep.resolve_text(&doc).unwrap();
    assert_eq!(doc.text(caret.block).unwrap(), "cdef");
    assert!(caret.offset.is_end());
}

#[test]
fn handle_is_tied_to_its_document() {
    let doc = document_from_text("same").unwrap();
    let copy = doc.clone();
    let handle = handle_in(&doc, 0, 1);

    assert_eq!(handle.resolve(&copy), Err(CaretError::ForeignDocument));
}

#[test]
fn handles_into_quotes_use_nested_paths() {
    let doc = document_from_text("intro\n> first\n> second").unwrap();
    let handle = handle_in(&doc, 2, 3);

    assert_eq!(handle.path().to_string(), "/1/1");
    let quote = doc.child_at(doc.root(), 1).unwrap();
    assert_eq!(doc.block(quote).unwrap().descriptor_id(), ids::QUOTE);
    assert_eq!(handle.resolve_text(&doc).unwrap().grapheme_index(), 3);
}
