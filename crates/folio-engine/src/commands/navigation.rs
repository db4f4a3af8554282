use super::{CommandError, CommandResult, ContextualCommand, ContextualCommandWith, EditorContext};
use crate::blocks::Direction;
use crate::caret::{BlockCaret, CaretError, DocumentCursorHandle, SelectionHandle, TextCaret};
use crate::editing::ActionStack;
use crate::view::{CaretMovementMode, ContentBlockView};

/// Moves the caret one grapheme forward or backward, crossing into the
/// neighbouring content block at block edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCaret {
    pub direction: Direction,
    /// Keep the anchor and only move the active end.
    pub extend: bool,
}

impl MoveCaret {
    pub fn forward() -> Self {
        Self {
            direction: Direction::Forward,
            extend: false,
        }
    }

    pub fn backward() -> Self {
        Self {
            direction: Direction::Backward,
            extend: false,
        }
    }

    pub fn extending(mut self) -> Self {
        self.extend = true;
        self
    }

    fn target(&self, context: &EditorContext) -> CommandResult<BlockCaret> {
        let caret = BlockCaret::from(context.caret()?);
        let moved = if self.direction.is_downstream() {
            context.document.next_caret(caret)?
        } else {
            context.document.previous_caret(caret)?
        };
        Ok(moved)
    }
}

impl ContextualCommand for MoveCaret {
    fn name(&self) -> &'static str {
        "move-caret"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        // Collapsing a selection always does something.
        if !self.extend && !context.selection.is_collapsed() {
            return true;
        }
        self.target(context).is_ok_and(|caret| !caret.is_invalid())
    }

    fn activate(&self, context: &mut EditorContext, _actions: &mut ActionStack) -> CommandResult {
        if !self.extend && !context.selection.is_collapsed() {
            let (start, end) = context.selection.ordered();
            let edge = if self.direction.is_downstream() {
                end.clone()
            } else {
                start.clone()
            };
            context.selection.collapse_to(edge);
            return Ok(());
        }
        let target = self.target(context)?;
        if target.is_invalid() {
            return Err(CommandError::NotActive(self.name()));
        }
        let handle = target.serialize(&context.document)?;
        if self.extend {
            context.selection.active = handle;
        } else {
            context.selection.collapse_to(handle);
        }
        Ok(())
    }
}

/// Moves the caret one line up or down with the help of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveVertically {
    pub up: bool,
    pub extend: bool,
}

impl MoveVertically {
    pub fn up() -> Self {
        Self {
            up: true,
            extend: false,
        }
    }

    pub fn down() -> Self {
        Self {
            up: false,
            extend: false,
        }
    }

    fn target(
        &self,
        context: &EditorContext,
        view: &dyn ContentBlockView,
    ) -> CommandResult<BlockCaret> {
        let document = &context.document;
        let caret = BlockCaret::from(context.caret()?);
        let bounds = view.measure_selection_bounds(document, caret, caret)?;
        let mode = CaretMovementMode::Position(bounds.x);

        let within = if self.up {
            view.caret_above(document, caret, mode)?
        } else {
            view.caret_below(document, caret, mode)?
        };
        if !within.is_invalid() {
            return Ok(within);
        }

        let block = caret.block().ok_or(CaretError::Invalid)?;
        let direction = if self.up {
            Direction::Top
        } else {
            Direction::Bottom
        };
        match document.get_block_to(direction, block) {
            Some(next) if self.up => Ok(view.caret_from_bottom(document, next, mode)?),
            Some(next) => Ok(view.caret_from_top(document, next, mode)?),
            None => Ok(BlockCaret::INVALID),
        }
    }
}

impl<'v> ContextualCommandWith<&'v dyn ContentBlockView> for MoveVertically {
    fn name(&self) -> &'static str {
        if self.up { "move-up" } else { "move-down" }
    }

    fn can_activate(&self, context: &EditorContext, view: &&'v dyn ContentBlockView) -> bool {
        self.target(context, *view)
            .is_ok_and(|caret| !caret.is_invalid())
    }

    fn activate(
        &self,
        context: &mut EditorContext,
        _actions: &mut ActionStack,
        view: &'v dyn ContentBlockView,
    ) -> CommandResult {
        let target = self.target(context, view)?;
        if target.is_invalid() {
            return Err(CommandError::NotActive(self.name()));
        }
        let handle = target.serialize(&context.document)?;
        if self.extend {
            context.selection.active = handle;
        } else {
            context.selection.collapse_to(handle);
        }
        Ok(())
    }
}

/// Selects the whole of the block under the caret.
///
/// Selections never span blocks, so "all" is the current block.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl ContextualCommand for SelectAll {
    fn name(&self) -> &'static str {
        "select-all"
    }

    fn can_activate(&self, context: &EditorContext) -> bool {
        context.caret().is_ok()
    }

    fn activate(&self, context: &mut EditorContext, _actions: &mut ActionStack) -> CommandResult {
        let caret = context.caret()?;
        let document = &context.document;
        let start = TextCaret::at_start(document, caret.block)?;
        let end = TextCaret::at_end(document, caret.block)?;
        context.selection = SelectionHandle::new(
            DocumentCursorHandle::for_text(document, start)?,
            DocumentCursorHandle::for_text(document, end)?,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{LineView, context_with_paragraphs};
    use pretty_assertions::assert_eq;

    #[test]
    fn move_forward_crosses_into_the_next_block() {
        let (mut context, mut actions) = context_with_paragraphs(&["a", "b"]);
        MoveCaret::forward().activate(&mut context, &mut actions).unwrap();
        assert_eq!(context.caret().unwrap().grapheme_index(), 1);

        MoveCaret::forward().activate(&mut context, &mut actions).unwrap();
        let caret = context.caret().unwrap();
        assert_eq!(caret.block, context.document.content_blocks()[1]);
        assert_eq!(caret.grapheme_index(), 0);
    }

    #[test]
    fn move_backward_at_document_start_is_inactive() {
        let (context, _) = context_with_paragraphs(&["a"]);
        assert!(!MoveCaret::backward().can_activate(&context));
    }

    #[test]
    fn moving_without_extend_collapses_the_selection() {
        let (mut context, mut actions) = context_with_paragraphs(&["abc"]);
        MoveCaret::forward()
            .extending()
            .activate(&mut context, &mut actions)
            .unwrap();
        MoveCaret::forward()
            .extending()
            .activate(&mut context, &mut actions)
            .unwrap();
        assert!(!context.selection.is_collapsed());

        MoveCaret::backward().activate(&mut context, &mut actions).unwrap();
        assert!(context.selection.is_collapsed());
        assert_eq!(context.caret().unwrap().grapheme_index(), 0);
    }

    #[test]
    fn select_all_spans_the_current_block() {
        let (mut context, mut actions) = context_with_paragraphs(&["héllo"]);
        SelectAll.activate(&mut context, &mut actions).unwrap();
        let (start, end) = context.selected_range().unwrap().unwrap();
        assert_eq!(start.grapheme_index(), 0);
        assert_eq!(end.grapheme_index(), 5);
    }

    #[test]
    fn vertical_moves_follow_the_measured_column() {
        let (mut context, mut actions) = context_with_paragraphs(&["abcdef", "xy", "uvwxyz"]);
        let first = context.document.content_blocks()[0];
        let caret = TextCaret::from_grapheme_index(&context.document, first, 4).unwrap();
        context.set_caret(caret).unwrap();
        let view: &dyn ContentBlockView = &LineView;

        MoveVertically::down()
            .activate(&mut context, &mut actions, view)
            .unwrap();
        assert_eq!(context.caret().unwrap().grapheme_index(), 2);

        MoveVertically::down()
            .activate(&mut context, &mut actions, view)
            .unwrap();
        assert_eq!(context.caret().unwrap().grapheme_index(), 2);
        assert!(!MoveVertically::down().can_activate(&context, &view));

        MoveVertically::up()
            .activate(&mut context, &mut actions, view)
            .unwrap();
        let caret = context.caret().unwrap();
        assert_eq!(caret.block, context.document.content_blocks()[1]);
    }
}
