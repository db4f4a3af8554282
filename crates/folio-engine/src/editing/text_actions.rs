use super::action::{ActionError, ActionResult, UndoableAction};
use crate::blocks::{BlockId, Document};
use crate::caret::DocumentCursorHandle;
use crate::text::{StyleFlag, TextBlockContent, TextOffset};

/// Text removed by an action, kept for undo and replayed on redo.
#[derive(Debug, Clone)]
struct Removed {
    start_byte: usize,
    content: TextBlockContent,
}

impl Removed {
    fn end_byte(&self) -> usize {
        self.start_byte + self.content.byte_len()
    }

    fn delete_from(&self, document: &mut Document, block: BlockId) -> ActionResult {
        document
            .text_content_mut(block)?
            .delete_bytes(self.start_byte..self.end_byte())?;
        Ok(())
    }

    fn restore_into(&self, document: &mut Document, block: BlockId) -> ActionResult {
        document
            .text_content_mut(block)?
            .splice_content(self.start_byte, self.content.clone())?;
        Ok(())
    }
}

fn same_block(a: &DocumentCursorHandle, b: &DocumentCursorHandle) -> bool {
    a.document() == b.document() && a.path() == b.path()
}

/// Resolves a range inside one text block.
fn resolve_range(
    document: &Document,
    start: &DocumentCursorHandle,
    end: &DocumentCursorHandle,
) -> ActionResult<(BlockId, TextOffset, TextOffset)> {
    let a = start.resolve_text(document)?;
    let b = end.resolve_text(document)?;
    if a.block != b.block {
        return Err(ActionError::NotApplicable(
            "selection spans several blocks".to_string(),
        ));
    }
    Ok((a.block, a.offset, b.offset))
}

/// Inserts text at a caret.
///
/// Merges with a following insertion that starts exactly where this one
/// ends, and with a following backspace that removes the tail of the text
/// inserted here.
#[derive(Debug)]
pub struct InsertTextAction {
    at: DocumentCursorHandle,
    text: String,
    start_byte: Option<usize>,
}

impl InsertTextAction {
    pub fn new(at: DocumentCursorHandle, text: impl Into<String>) -> Self {
        Self {
            at,
            text: text.into(),
            start_byte: None,
        }
    }

    /// The (possibly merged) text this action inserts.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn at(&self) -> &DocumentCursorHandle {
        &self.at
    }

    fn end_byte(&self) -> Option<usize> {
        self.start_byte.map(|start| start + self.text.len())
    }
}

impl UndoableAction for InsertTextAction {
    fn name(&self) -> &'static str {
        "insert-text"
    }

    fn description(&self) -> String {
        format!("Insert {:?}", self.text)
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let caret = self.at.resolve_text(document)?;
        document
            .text_content_mut(caret.block)?
            .insert(caret.offset, &self.text)?;
        self.start_byte = Some(caret.offset.byte_offset);
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let (Some(start), Some(end)) = (self.start_byte, self.end_byte()) else {
            return Err(ActionError::NotApplied(self.name()));
        };
        let block = self.at.resolve_block(document)?;
        document.text_content_mut(block)?.delete_bytes(start..end)?;
        Ok(())
    }

    fn try_merge(&mut self, _document: &Document, other: &dyn UndoableAction) -> bool {
        let Some(end) = self.end_byte() else {
            return false;
        };

        if let Some(insert) = other.as_any().downcast_ref::<InsertTextAction>() {
            if same_block(&self.at, &insert.at) && insert.start_byte == Some(end) {
                self.text.push_str(&insert.text);
                return true;
            }
            return false;
        }

        if let Some(delete) = other.as_any().downcast_ref::<DeleteTextAction>()
            && delete.direction == DeleteDirection::Previous
            && same_block(&self.at, &delete.at)
            && let Some(removed) = &delete.removed
            && removed.end_byte() == end
        {
            let removed_text = removed.content.text();
            if self.text.ends_with(removed_text.as_ref()) {
                self.text.truncate(self.text.len() - removed_text.len());
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteDirection {
    /// Backspace: the grapheme before the caret.
    Previous,
    /// Delete: the grapheme after the caret.
    Next,
}

/// Deletes one grapheme next to a caret. Consecutive deletions in the
/// same direction and block coalesce into one step.
#[derive(Debug)]
pub struct DeleteTextAction {
    at: DocumentCursorHandle,
    direction: DeleteDirection,
    removed: Option<Removed>,
}

impl DeleteTextAction {
    pub fn new(at: DocumentCursorHandle, direction: DeleteDirection) -> Self {
        Self {
            at,
            direction,
            removed: None,
        }
    }

    pub fn previous(at: DocumentCursorHandle) -> Self {
        Self::new(at, DeleteDirection::Previous)
    }

    pub fn next(at: DocumentCursorHandle) -> Self {
        Self::new(at, DeleteDirection::Next)
    }

    pub fn direction(&self) -> DeleteDirection {
        self.direction
    }

    /// Text removed so far; `None` before the first apply.
    pub fn removed_text(&self) -> Option<String> {
        self.removed
            .as_ref()
            .map(|removed| removed.content.text().into_owned())
    }
}

impl UndoableAction for DeleteTextAction {
    fn name(&self) -> &'static str {
        "delete-text"
    }

    fn description(&self) -> String {
        match self.direction {
            DeleteDirection::Previous => "Delete previous character".to_string(),
            DeleteDirection::Next => "Delete next character".to_string(),
        }
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        if let Some(removed) = &self.removed {
            let block = self.at.resolve_block(document)?;
            return removed.delete_from(document, block);
        }

        let caret = self.at.resolve_text(document)?;
        let content = document.text_content_mut(caret.block)?;
        let offset = content.resolve(caret.offset)?;
        let (start, end) = match self.direction {
            DeleteDirection::Previous => match content.previous_offset(offset) {
                Some(previous) => (previous, offset),
                None => {
                    return Err(ActionError::NotApplicable(
                        "nothing to delete before the caret".to_string(),
                    ));
                }
            },
            DeleteDirection::Next => match content.next_offset(offset) {
                Some(next) => (offset, next),
                None => {
                    return Err(ActionError::NotApplicable(
                        "nothing to delete after the caret".to_string(),
                    ));
                }
            },
        };
        let removed = content.extract_content(start, end)?;
        self.removed = Some(Removed {
            start_byte: start.byte_offset,
            content: removed,
        });
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let removed = self
            .removed
            .as_ref()
            .ok_or(ActionError::NotApplied("delete-text"))?;
        let block = self.at.resolve_block(document)?;
        removed.restore_into(document, block)
    }

    fn try_merge(&mut self, _document: &Document, other: &dyn UndoableAction) -> bool {
        let Some(delete) = other.as_any().downcast_ref::<DeleteTextAction>() else {
            return false;
        };
        if delete.direction != self.direction || !same_block(&self.at, &delete.at) {
            return false;
        }
        let (Some(mine), Some(theirs)) = (&mut self.removed, &delete.removed) else {
            return false;
        };
        match self.direction {
            DeleteDirection::Previous if theirs.end_byte() == mine.start_byte => {
                let mut content = theirs.content.clone();
                content.append_content(std::mem::take(&mut mine.content));
                mine.content = content;
                mine.start_byte = theirs.start_byte;
                true
            }
            DeleteDirection::Next if theirs.start_byte == mine.start_byte => {
                mine.content.append_content(theirs.content.clone());
                true
            }
            _ => false,
        }
    }
}

/// Deletes the range between two carets of the same text block.
#[derive(Debug)]
pub struct DeleteSelectionAction {
    start: DocumentCursorHandle,
    end: DocumentCursorHandle,
    removed: Option<Removed>,
}

impl DeleteSelectionAction {
    pub fn new(start: DocumentCursorHandle, end: DocumentCursorHandle) -> Self {
        Self {
            start,
            end,
            removed: None,
        }
    }
}

impl UndoableAction for DeleteSelectionAction {
    fn name(&self) -> &'static str {
        "delete-selection"
    }

    fn description(&self) -> String {
        "Delete selection".to_string()
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        if let Some(removed) = &self.removed {
            let block = self.start.resolve_block(document)?;
            return removed.delete_from(document, block);
        }
        let (block, a, b) = resolve_range(document, &self.start, &self.end)?;
        let content = document.text_content_mut(block)?;
        let removed = content.extract_content(a, b)?;
        self.removed = Some(Removed {
            start_byte: a.byte_offset.min(b.byte_offset),
            content: removed,
        });
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let removed = self
            .removed
            .as_ref()
            .ok_or(ActionError::NotApplied("delete-selection"))?;
        let block = self.start.resolve_block(document)?;
        removed.restore_into(document, block)
    }
}

/// Turns one style flag on or off over a range of one text block.
#[derive(Debug)]
pub struct FormatTextAction {
    start: DocumentCursorHandle,
    end: DocumentCursorHandle,
    flag: StyleFlag,
    enable: bool,
    previous: Option<Removed>,
}

impl FormatTextAction {
    pub fn new(
        start: DocumentCursorHandle,
        end: DocumentCursorHandle,
        flag: StyleFlag,
        enable: bool,
    ) -> Self {
        Self {
            start,
            end,
            flag,
            enable,
            previous: None,
        }
    }
}

impl UndoableAction for FormatTextAction {
    fn name(&self) -> &'static str {
        "format-text"
    }

    fn description(&self) -> String {
        let verb = if self.enable { "Apply" } else { "Remove" };
        format!("{verb} {}", self.flag.name())
    }

    fn apply(&mut self, document: &mut Document) -> ActionResult {
        let (block, a, b) = resolve_range(document, &self.start, &self.end)?;
        let content = document.text_content_mut(block)?;
        let previous = content.clone_content(a, b)?;
        let (flag, enable) = (self.flag, self.enable);
        content.update_style(a, b, |style| style.with(flag, enable))?;
        self.previous = Some(Removed {
            start_byte: a.byte_offset.min(b.byte_offset),
            content: previous,
        });
        Ok(())
    }

    fn undo(&mut self, document: &mut Document) -> ActionResult {
        let previous = self
            .previous
            .as_ref()
            .ok_or(ActionError::NotApplied("format-text"))?;
        let block = self.start.resolve_block(document)?;
        previous.delete_from(document, block)?;
        previous.restore_into(document, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{ActionStack, AlwaysMerge, NeverMerge};
    use crate::tests::{document_with_paragraphs, handle_at, texts};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn first_block(doc: &Document) -> BlockId {
        doc.content_blocks()[0]
    }

    #[test]
    fn insert_then_delete_next_inside() {
        let mut doc = document_with_paragraphs(&[""]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        let insert = InsertTextAction::new(handle_at(&doc, block, 0), "TheWord");
        stack.do_action(&mut doc, Box::new(insert)).unwrap();
        let delete = DeleteTextAction::next(handle_at(&doc, block, 3));
        stack.do_action(&mut doc, Box::new(delete)).unwrap();

        assert_eq!(texts(&doc), vec!["Theord"]);
        assert_eq!(stack.undo_len(), 2);
    }

    #[rstest]
    fn delete_next_removes_one_character(#[values(0, 1, 2, 3, 4, 5, 6)] index: usize) {
        let mut doc = document_with_paragraphs(&["TheWord"]);
        let mut stack = ActionStack::new();
        let block = first_block(&doc);

        let delete = DeleteTextAction::next(handle_at(&doc, block, index));
        stack.do_action(&mut doc, Box::new(delete)).unwrap();

        let mut expected = "TheWord".to_string();
        expected.remove(index);
        assert_eq!(texts(&doc), vec![expected]);

        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["TheWord"]);
    }

    #[test]
    fn consecutive_inserts_merge_into_one_step() {
        let mut doc = document_with_paragraphs(&[""]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        let first = InsertTextAction::new(handle_at(&doc, block, 0), "The text");
        stack.do_action(&mut doc, Box::new(first)).unwrap();
        let second = InsertTextAction::new(handle_at(&doc, block, 8), "And More");
        stack.do_action(&mut doc, Box::new(second)).unwrap();

        assert_eq!(stack.undo_len(), 1);
        let top = stack.peek_undo().unwrap();
        let merged = top.as_any().downcast_ref::<InsertTextAction>().unwrap();
        assert_eq!(merged.text(), "The textAnd More");

        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec![""]);
        stack.redo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["The textAnd More"]);
    }

    #[test]
    fn insert_elsewhere_does_not_merge() {
        let mut doc = document_with_paragraphs(&[""]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        let first = InsertTextAction::new(handle_at(&doc, block, 0), "abc");
        stack.do_action(&mut doc, Box::new(first)).unwrap();
        let second = InsertTextAction::new(handle_at(&doc, block, 1), "x");
        stack.do_action(&mut doc, Box::new(second)).unwrap();

        assert_eq!(stack.undo_len(), 2);
        assert_eq!(texts(&doc), vec!["axbc"]);
    }

    #[test]
    fn backspace_over_typed_text_shortens_the_insert() {
        let mut doc = document_with_paragraphs(&["> "]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        let typed = InsertTextAction::new(handle_at(&doc, block, 2), "helo");
        stack.do_action(&mut doc, Box::new(typed)).unwrap();
        let backspace = DeleteTextAction::previous(handle_at(&doc, block, 6));
        stack.do_action(&mut doc, Box::new(backspace)).unwrap();
        let backspace = DeleteTextAction::previous(handle_at(&doc, block, 5));
        stack.do_action(&mut doc, Box::new(backspace)).unwrap();

        assert_eq!(stack.undo_len(), 1);
        assert_eq!(texts(&doc), vec!["> he"]);
        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["> "]);
    }

    #[test]
    fn backspace_past_the_insert_does_not_merge() {
        let mut doc = document_with_paragraphs(&["ab"]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        let typed = InsertTextAction::new(handle_at(&doc, block, 2), "c");
        stack.do_action(&mut doc, Box::new(typed)).unwrap();
        for index in [3, 2] {
            let backspace = DeleteTextAction::previous(handle_at(&doc, block, index));
            stack.do_action(&mut doc, Box::new(backspace)).unwrap();
        }

        assert_eq!(texts(&doc), vec!["a"]);
        assert_eq!(stack.undo_len(), 2);
        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["ab"]);
    }

    #[test]
    fn insert_and_delete_next_never_merge() {
        let mut doc = document_with_paragraphs(&["xy"]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        let typed = InsertTextAction::new(handle_at(&doc, block, 1), "a");
        stack.do_action(&mut doc, Box::new(typed)).unwrap();
        let delete = DeleteTextAction::next(handle_at(&doc, block, 2));
        stack.do_action(&mut doc, Box::new(delete)).unwrap();

        assert_eq!(texts(&doc), vec!["xa"]);
        assert_eq!(stack.undo_len(), 2);
    }

    #[test]
    fn repeated_deletes_coalesce_and_undo_together() {
        let mut doc = document_with_paragraphs(&["abcdef"]);
        let mut stack = ActionStack::new().with_policy(AlwaysMerge);
        let block = first_block(&doc);

        for index in [4, 3, 2] {
            let backspace = DeleteTextAction::previous(handle_at(&doc, block, index));
            stack.do_action(&mut doc, Box::new(backspace)).unwrap();
        }
        for _ in 0..2 {
            let delete = DeleteTextAction::next(handle_at(&doc, block, 1));
            stack.do_action(&mut doc, Box::new(delete)).unwrap();
        }

        assert_eq!(texts(&doc), vec!["a"]);
        assert_eq!(stack.undo_len(), 2);
        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["aef"]);
        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["abcdef"]);
        stack.redo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["aef"]);
    }

    #[test]
    fn delete_at_edge_is_not_applicable() {
        let mut doc = document_with_paragraphs(&["ab"]);
        let block = first_block(&doc);
        let mut action = DeleteTextAction::previous(handle_at(&doc, block, 0));
        assert!(matches!(
            action.apply(&mut doc),
            Err(ActionError::NotApplicable(_))
        ));
    }

    #[test]
    fn deleting_a_cluster_removes_it_whole() {
        let mut doc = document_with_paragraphs(&["a\u{1F1FA}\u{1F1F8}b"]);
        let mut stack = ActionStack::new();
        let block = first_block(&doc);
        let delete = DeleteTextAction::next(handle_at(&doc, block, 1));
        stack.do_action(&mut doc, Box::new(delete)).unwrap();
        assert_eq!(texts(&doc), vec!["ab"]);
        stack.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), vec!["a\u{1F1FA}\u{1F1F8}b"]);
    }

    #[test]
    fn selection_delete_round_trips_styles() {
        let mut doc = document_with_paragraphs(&["Hello world"]);
        let block = first_block(&doc);
        let mut stack = ActionStack::new().with_policy(NeverMerge);
        let bold = FormatTextAction::new(
            handle_at(&doc, block, 0),
            handle_at(&doc, block, 5),
            StyleFlag::Bold,
            true,
        );
        stack.do_action(&mut doc, Box::new(bold)).unwrap();
        let before = doc.clone();

        let delete =
            DeleteSelectionAction::new(handle_at(&doc, block, 8), handle_at(&doc, block, 3));
        stack.do_action(&mut doc, Box::new(delete)).unwrap();
        assert_eq!(texts(&doc), vec!["Helrld"]);

        stack.undo(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn format_undo_restores_previous_runs() {
        let mut doc = document_with_paragraphs(&["abcdef"]);
        let block = first_block(&doc);
        let before = doc.clone();
        let mut stack = ActionStack::new();

        let italic = FormatTextAction::new(
            handle_at(&doc, block, 1),
            handle_at(&doc, block, 4),
            StyleFlag::Italic,
            true,
        );
        stack.do_action(&mut doc, Box::new(italic)).unwrap();
        assert_eq!(doc.text_content(block).unwrap().fragments().len(), 3);

        stack.undo(&mut doc).unwrap();
        assert_eq!(doc, before);
        assert_eq!(doc.text_content(block).unwrap().fragments().len(), 1);
    }
}
