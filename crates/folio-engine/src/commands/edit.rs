use std::collections::BTreeMap;

use super::{CommandError, CommandResult, ContextualCommand, ContextualCommandWith, EditorContext};
use crate::blocks::{BlockCategory, BlockId};
use crate::caret::{DocumentCursorHandle, TEXT_CARET_MOVER, TextCaret};
use crate::editing::{
    ActionStack, BreakTextBlockAction, ConvertBlockAction, DeleteSelectionAction,
    DeleteTextAction, FormatTextAction, InsertTextAction, MergeTextBlocksAction,
};
use crate::text::StyleFlag;

/// Removes a non-empty selection and returns the caret where it was.
fn delete_selection(
    context: &mut EditorContext,
    actions: &mut ActionStack,
) -> CommandResult<Option<TextCaret>> {
    let Some((start, end)) = context.selected_range()? else {
        return Ok(None);
    };
    let document = &mut context.document;
    let action = DeleteSelectionAction::new(
        DocumentCursorHandle::for_text(document, start)?,
        DocumentCursorHandle::for_text(document, end)?,
    );
    actions.do_action(document, Box::new(action))?;
    let content = document.text_content(start.block)?;
    let caret = TextCaret::new(start.block, content.offset_from_byte(start.byte_offset()));
    context.set_caret(caret)?;
    Ok(Some(caret))
}

fn is_text_block(context: &EditorContext, block: Option<BlockId>) -> bool {
    block.is_some_and(|block| {
        context
            .document
            .block(block)
            .is_ok_and(|b| b.category() == BlockCategory::Text)
    })
}

/// Types text at the caret, replacing the selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertText;

impl ContextualCommandWith<String> for InsertText {
    fn name(&self) -> &'static str {
        "insert-text"
    }

    fn can_activate(&self, context: &EditorContext, text: &String) -> bool {
        !text.is_empty() && context.caret().is_ok()
    }

    fn activate(
        &self,
        context: &mut EditorContext,
        actions: &mut ActionStack,
        text: String,
    ) -> CommandResult {
        if !self.can_activate(context, &text) {
            return Err(CommandError::NotActive(self.name()));
        }
        let caret = match delete_selection(context, actions)? {
            Some(caret) => caret,
            None => context.caret()?,
        };
        let handle = DocumentCursorHandle::for_text(&context.document, caret)?;
        actions.do_action(
            &mut context.document,
            Box::new(InsertTextAction::new(handle, text.as_str())),
        )?;
        let content = context.document.text_content(caret.block)?;
        let after = content.offset_from_byte(caret.byte_offset() + text.len());
        context.set_caret(TextCaret::new(caret.block, after))
    }
}

/// Backspace. Joins the block onto the previous one at a block start.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletePrevious;

impl ContextualCommand for DeletePrevious {
    fn name(&self) -> &'static str {
        "delete-previous"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        let Ok(caret) = context.caret() else {
            return false;
        };
        if !context.selection.is_collapsed() || caret.grapheme_index() > 0 {
            return true;
        }
        let previous = context
            .document
            .block(caret.block)
            .ok()
            .and_then(|block| block.previous_block());
        is_text_block(context, previous)
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        if !self.can_activate(context) {
            return Err(CommandError::NotActive(self.name()));
        }
        if delete_selection(context, actions)?.is_some() {
            return Ok(());
        }
        let caret = context.caret()?;
        let document = &mut context.document;

        if caret.grapheme_index() == 0 {
            let previous = document
                .block(caret.block)?
                .previous_block()
                .ok_or(CommandError::NotActive(self.name()))?;
            let join = document.text_content(previous)?.byte_len();
            let path = document.path_of(caret.block)?;
            actions.do_action(document, Box::new(MergeTextBlocksAction::new(path)))?;
            let offset = document.text_content(previous)?.offset_from_byte(join);
            return context.set_caret(TextCaret::new(previous, offset));
        }

        let handle = DocumentCursorHandle::for_text(document, caret)?;
        let content = document.text_content(caret.block)?;
        let target = content
            .previous_offset(caret.offset)
            .ok_or(CommandError::NotActive(self.name()))?;
        actions.do_action(document, Box::new(DeleteTextAction::previous(handle)))?;
        let offset = document
            .text_content(caret.block)?
            .offset_from_byte(target.byte_offset);
        context.set_caret(TextCaret::new(caret.block, offset))
    }
}

/// Delete. Pulls the next block into this one at a block end.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteNext;

impl ContextualCommand for DeleteNext {
    fn name(&self) -> &'static str {
        "delete-next"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        let Ok(caret) = context.caret() else {
            return false;
        };
        if !context.selection.is_collapsed() || !caret.offset.is_end() {
            return true;
        }
        let next = context
            .document
            .block(caret.block)
            .ok()
            .and_then(|block| block.next_block());
        is_text_block(context, next)
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        if !self.can_activate(context) {
            return Err(CommandError::NotActive(self.name()));
        }
        if delete_selection(context, actions)?.is_some() {
            return Ok(());
        }
        let caret = context.caret()?;
        let document = &mut context.document;

        if caret.offset.is_end() {
            let next = document
                .block(caret.block)?
                .next_block()
                .ok_or(CommandError::NotActive(self.name()))?;
            let path = document.path_of(next)?;
            actions.do_action(document, Box::new(MergeTextBlocksAction::new(path)))?;
        } else {
            let handle = DocumentCursorHandle::for_text(document, caret)?;
            actions.do_action(document, Box::new(DeleteTextAction::next(handle)))?;
        }
        let offset = document
            .text_content(caret.block)?
            .offset_from_byte(caret.byte_offset());
        context.set_caret(TextCaret::new(caret.block, offset))
    }
}

/// Enter. Splits the block, or inserts a line break in blocks that do not
/// split (code).
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakBlock;

impl ContextualCommand for BreakBlock {
    fn name(&self) -> &'static str {
        "break-block"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        context.caret().is_ok()
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        let caret = match delete_selection(context, actions)? {
            Some(caret) => caret,
            None => context.caret()?,
        };
        let document = &mut context.document;
        let descriptor = document.block(caret.block)?.descriptor_id();
        let splittable = document.registry().get(descriptor)?.splittable;
        let handle = DocumentCursorHandle::for_text(document, caret)?;

        if !splittable {
            actions.do_action(document, Box::new(InsertTextAction::new(handle, "\n")))?;
            let offset = document
                .text_content(caret.block)?
                .offset_from_byte(caret.byte_offset() + 1);
            return context.set_caret(TextCaret::new(caret.block, offset));
        }

        let next_path = handle
            .path()
            .next_sibling()
            .ok_or(CommandError::NotActive(self.name()))?;
        actions.do_action(document, Box::new(BreakTextBlockAction::new(handle)))?;
        let landing = DocumentCursorHandle::from_path(document, next_path, 0, &TEXT_CARET_MOVER);
        context.selection.collapse_to(landing);
        Ok(())
    }
}

/// Changes the type of the block under the caret.
#[derive(Debug, Clone, Default)]
pub struct ConvertBlock {
    pub descriptor: &'static str,
    pub attributes: BTreeMap<String, String>,
}

impl ConvertBlock {
    pub fn new(descriptor: &'static str) -> Self {
        Self {
            descriptor,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

impl ContextualCommand for ConvertBlock {
    fn name(&self) -> &'static str {
        "convert-block"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        let Ok(caret) = context.caret() else {
            return false;
        };
        let Ok(block) = context.document.block(caret.block) else {
            return false;
        };
        let same_type =
            block.descriptor_id() == self.descriptor && block.attributes() == &self.attributes;
        !same_type
            && context
                .document
                .registry()
                .get(self.descriptor)
                .is_ok_and(|d| d.category == BlockCategory::Text)
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        if !self.can_activate(context) {
            return Err(CommandError::NotActive(self.name()));
        }
        let handle = context.selection.active.clone();
        let path = handle.path().clone();
        let action = ConvertBlockAction::new(path, self.descriptor, self.attributes.clone());
        actions.do_action(&mut context.document, Box::new(action))?;
        context.repair_selection()
    }
}

/// Toggles a style flag over the selection.
#[derive(Debug, Clone, Copy)]
pub struct ToggleStyle(pub StyleFlag);

impl ContextualCommand for ToggleStyle {
    fn name(&self) -> &'static str {
        "toggle-style"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        matches!(context.selected_range(), Ok(Some(_)))
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        let Some((start, end)) = context.selected_range()? else {
            return Err(CommandError::NotActive(self.name()));
        };
        let document = &mut context.document;
        let selected = document
            .text_content(start.block)?
            .clone_content(start.offset, end.offset)
            .map_err(crate::blocks::DocumentError::from)?;
        let enable = !selected
            .fragments()
            .iter()
            .all(|fragment| fragment.style().contains(self.0));
        let action = FormatTextAction::new(
            DocumentCursorHandle::for_text(document, start)?,
            DocumentCursorHandle::for_text(document, end)?,
            self.0,
            enable,
        );
        actions.do_action(document, Box::new(action))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Undo;

impl ContextualCommand for Undo {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn can_activate(&self, _context: &EditorContext) -> bool {
        true
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        if actions.undo(&mut context.document)? {
            context.repair_selection()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Redo;

impl ContextualCommand for Redo {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn can_activate(&self, _context: &EditorContext) -> bool {
        true
    }

    fn activate(&self, context: &mut EditorContext, actions: &mut ActionStack) -> CommandResult {
        if actions.redo(&mut context.document)? {
            context.repair_selection()?;
        }
        Ok(())
    }
}
