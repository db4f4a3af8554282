//! Terminal layout of a document: one row per wrapped line, one column per
//! grapheme.

use folio_engine::blocks::ids;
use folio_engine::caret::{BlockCaret, CaretError, TextCaret};
use folio_engine::text::TextStyle;
use folio_engine::view::{CaretMovementMode, ContentBlockView, SelectionBounds};
use folio_engine::{BlockId, Document, EditorContext, StyleFlag};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

pub struct TerminalView {
    width: usize,
}

/// Output of [`TerminalView::render`].
pub struct Rendered {
    pub lines: Vec<Line<'static>>,
    /// Cursor column and row, relative to the top of the document.
    pub cursor: Option<(u16, u16)>,
}

impl Rendered {
    /// First row to show so the cursor stays inside `height` rows.
    pub fn scroll_to(&self, height: u16) -> u16 {
        match self.cursor {
            Some((_, y)) if height > 0 && y >= height => y - height + 1,
            _ => 0,
        }
    }
}

impl TerminalView {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    fn prefix(document: &Document, block: BlockId) -> String {
        let depth = document
            .path_of(block)
            .map(|path| path.depth().saturating_sub(1))
            .unwrap_or_default();
        let mut prefix = "│ ".repeat(depth);
        if let Ok(node) = document.block(block) {
            match node.descriptor_id() {
                ids::HEADING => {
                    let level = node
                        .attribute("level")
                        .and_then(|level| level.parse::<usize>().ok())
                        .unwrap_or(1);
                    prefix.push_str(&"#".repeat(level));
                    prefix.push(' ');
                }
                ids::CODE => prefix.push_str("▏ "),
                _ => {}
            }
        }
        prefix
    }

    fn text_width(&self, document: &Document, block: BlockId) -> usize {
        let prefix = Self::prefix(document, block).chars().count();
        self.width.saturating_sub(prefix).max(1)
    }

    /// Grapheme ranges of the wrapped lines of `block`; never empty.
    fn line_ranges(&self, document: &Document, block: BlockId) -> Vec<Range<usize>> {
        let len = document
            .text_content(block)
            .map(|content| content.grapheme_len())
            .unwrap_or_default();
        let width = self.text_width(document, block);
        let count = len.div_ceil(width).max(1);
        (0..count)
            .map(|line| line * width..((line + 1) * width).min(len))
            .collect()
    }

    /// Line and column of a grapheme index inside `block`.
    fn locate(&self, document: &Document, block: BlockId, grapheme: usize) -> (usize, usize) {
        let ranges = self.line_ranges(document, block);
        let width = self.text_width(document, block);
        let line = (grapheme / width).min(ranges.len() - 1);
        (line, grapheme - ranges[line].start)
    }

    fn caret_on_line(
        &self,
        document: &Document,
        block: BlockId,
        line: usize,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        let ranges = self.line_ranges(document, block);
        let range = &ranges[line.min(ranges.len() - 1)];
        let last = line + 1 >= ranges.len();
        // Only the last line has a position after its final grapheme.
        let max_column = if last {
            range.len()
        } else {
            range.len().saturating_sub(1)
        };
        let column = match mode {
            CaretMovementMode::Position(x) => (x.max(0.0) as usize).min(max_column),
            CaretMovementMode::None | CaretMovementMode::Home => 0,
            CaretMovementMode::End => max_column,
        };
        Ok(TextCaret::from_grapheme_index(document, block, range.start + column)?.into())
    }

    pub fn render(&self, context: &EditorContext) -> Rendered {
        let document = &context.document;
        let caret = context.caret().ok();
        let selected = context
            .selected_range()
            .ok()
            .flatten()
            .map(|(start, end)| (start.block, start.grapheme_index()..end.grapheme_index()));

        let mut lines = Vec::new();
        let mut cursor = None;
        for block in document.content_blocks() {
            let Ok(content) = document.text_content(block) else {
                continue;
            };
            let prefix = Self::prefix(document, block);
            let base = block_style(document, block);

            let mut fragment_ends = Vec::new();
            let mut end = 0;
            for fragment in content.fragments() {
                end += fragment.text().len();
                fragment_ends.push((end, fragment.style()));
            }
            let text = content.text();
            let mut cells: Vec<(String, Style)> = text
                .grapheme_indices(true)
                .map(|(byte, grapheme)| {
                    let style = fragment_ends
                        .iter()
                        .find(|(end, _)| byte < *end)
                        .map_or(base, |(_, style)| base.patch(text_style(*style)));
                    let shown = if grapheme == "\n" { "↵" } else { grapheme };
                    (shown.to_string(), style)
                })
                .collect();
            if let Some((selected_block, range)) = &selected
                && *selected_block == block
            {
                for (_, style) in cells.iter_mut().take(range.end).skip(range.start) {
                    *style = style.add_modifier(Modifier::REVERSED);
                }
            }

            let first_row = lines.len();
            for range in self.line_ranges(document, block) {
                let mut spans = vec![Span::styled(
                    prefix.clone(),
                    Style::default().fg(Color::DarkGray),
                )];
                spans.extend(
                    cells
                        .get(range)
                        .unwrap_or_default()
                        .iter()
                        .map(|(text, style)| Span::styled(text.clone(), *style)),
                );
                lines.push(Line::from(spans));
            }

            if let Some(caret) = caret
                && caret.block == block
            {
                let (line, column) = self.locate(document, block, caret.grapheme_index());
                let x = prefix.chars().count() + column;
                cursor = Some((x as u16, (first_row + line) as u16));
            }
        }

        Rendered { lines, cursor }
    }
}

fn block_style(document: &Document, block: BlockId) -> Style {
    match document.block(block).map(|node| node.descriptor_id()) {
        Ok(ids::HEADING) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Ok(ids::CODE) => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    }
}

fn text_style(style: TextStyle) -> Style {
    let mut result = Style::default();
    if style.contains(StyleFlag::Bold) {
        result = result.add_modifier(Modifier::BOLD);
    }
    if style.contains(StyleFlag::Italic) {
        result = result.add_modifier(Modifier::ITALIC);
    }
    if style.contains(StyleFlag::Underline) {
        result = result.add_modifier(Modifier::UNDERLINED);
    }
    if style.contains(StyleFlag::Code) {
        result = result.fg(Color::Green);
    }
    result
}

impl ContentBlockView for TerminalView {
    fn measure_selection_bounds(
        &self,
        document: &Document,
        start: BlockCaret,
        end: BlockCaret,
    ) -> Result<SelectionBounds, CaretError> {
        let start = start.downcast::<TextCaret>()?;
        let end = end.downcast::<TextCaret>()?;
        let (line, column) = self.locate(document, start.block, start.grapheme_index());
        let (end_line, end_column) = self.locate(document, end.block, end.grapheme_index());
        Ok(SelectionBounds {
            x: column as f32,
            y: line as f32,
            width: if end_line == line {
                end_column.saturating_sub(column) as f32
            } else {
                self.width as f32
            },
            height: (end_line.saturating_sub(line) + 1) as f32,
        })
    }

    fn caret_from_top(
        &self,
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        self.caret_on_line(document, block, 0, mode)
    }

    fn caret_from_bottom(
        &self,
        document: &Document,
        block: BlockId,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        let last = self.line_ranges(document, block).len() - 1;
        self.caret_on_line(document, block, last, mode)
    }

    fn caret_above(
        &self,
        document: &Document,
        caret: BlockCaret,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        let caret = caret.downcast::<TextCaret>()?;
        match self.locate(document, caret.block, caret.grapheme_index()) {
            (0, _) => Ok(BlockCaret::INVALID),
            (line, _) => self.caret_on_line(document, caret.block, line - 1, mode),
        }
    }

    fn caret_below(
        &self,
        document: &Document,
        caret: BlockCaret,
        mode: CaretMovementMode,
    ) -> Result<BlockCaret, CaretError> {
        let caret = caret.downcast::<TextCaret>()?;
        let lines = self.line_ranges(document, caret.block).len();
        match self.locate(document, caret.block, caret.grapheme_index()) {
            (line, _) if line + 1 >= lines => Ok(BlockCaret::INVALID),
            (line, _) => self.caret_on_line(document, caret.block, line + 1, mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_engine::document_from_text;

    #[test]
    fn long_paragraphs_wrap_at_the_view_width() {
        let doc = document_from_text("abcdefghij").unwrap();
        let view = TerminalView::new(4);
        let block = doc.content_blocks()[0];

        assert_eq!(view.line_ranges(&doc, block), vec![0..4, 4..8, 8..10]);
        assert_eq!(view.locate(&doc, block, 5), (1, 1));
        assert_eq!(view.locate(&doc, block, 10), (2, 2));
    }

    #[test]
    fn heading_prefix_narrows_the_text() {
        let doc = document_from_text("## abcdef").unwrap();
        let view = TerminalView::new(7);
        let block = doc.content_blocks()[0];

        assert_eq!(TerminalView::prefix(&doc, block), "## ");
        assert_eq!(view.line_ranges(&doc, block), vec![0..4, 4..6]);
    }

    #[test]
    fn caret_below_stays_in_the_wrapped_block() {
        let doc = document_from_text("abcdefghij\nxy").unwrap();
        let view = TerminalView::new(4);
        let block = doc.content_blocks()[0];
        let caret = TextCaret::from_grapheme_index(&doc, block, 1).unwrap();

        let below = view
            .caret_below(&doc, caret.into(), CaretMovementMode::Position(3.0))
            .unwrap();
        assert_eq!(below.downcast::<TextCaret>().unwrap().grapheme_index(), 7);

        let end = TextCaret::from_grapheme_index(&doc, block, 9).unwrap();
        assert!(
            view.caret_below(&doc, end.into(), CaretMovementMode::None)
                .unwrap()
                .is_invalid()
        );
    }

    #[test]
    fn render_places_the_cursor_after_the_prefix() {
        let doc = document_from_text("intro\n> quoted").unwrap();
        let mut context = EditorContext::new(doc).unwrap();
        let quoted = context.document.content_blocks()[1];
        let caret = TextCaret::from_grapheme_index(&context.document, quoted, 2).unwrap();
        context.set_caret(caret).unwrap();

        let rendered = TerminalView::new(20).render(&context);

        assert_eq!(rendered.lines.len(), 2);
        assert_eq!(rendered.cursor, Some((4, 1)));
        assert_eq!(rendered.scroll_to(1), 1);
    }
}
