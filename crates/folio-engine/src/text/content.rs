use std::borrow::Cow;
use std::ops::Range;

use uuid::Uuid;

use super::graphemes;
use super::{TextError, TextOffset, TextStyle};

/// Identity of a fragment object. Two fragments never share an id unless
/// one is a plain `Clone` of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentId(pub Uuid);

impl FragmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FragmentId {
    fn default() -> Self {
        Self::new()
    }
}

/// A contiguous run of text sharing one style.
#[derive(Debug, Clone)]
pub struct TextFragment {
    id: FragmentId,
    text: String,
    style: TextStyle,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            id: FragmentId::new(),
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::PLAIN)
    }

    pub fn id(&self) -> FragmentId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }
}

/// The content of one text block.
///
/// Invariants: the fragment list is never empty, fragments other than a
/// sole placeholder are non-empty, and neighbouring fragments differ in
/// style. Every mutating operation restores these before returning.
#[derive(Debug, Clone)]
pub struct TextBlockContent {
    fragments: Vec<TextFragment>,
}

impl Default for TextBlockContent {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TextBlockContent {
    fn eq(&self, other: &Self) -> bool {
        self.fragments
            .iter()
            .map(|f| (f.text.as_str(), f.style))
            .eq(other.fragments.iter().map(|f| (f.text.as_str(), f.style)))
    }
}

impl Eq for TextBlockContent {}

impl From<&str> for TextBlockContent {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl TextBlockContent {
    /// Empty content with a single plain placeholder fragment.
    pub fn new() -> Self {
        Self {
            fragments: vec![TextFragment::plain("")],
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            fragments: vec![TextFragment::plain(text)],
        }
    }

    /// Builds content from fragments; an empty list yields a placeholder
    /// fragment carrying `fallback`.
    pub fn from_fragments(fragments: Vec<TextFragment>, fallback: TextStyle) -> Self {
        let mut content = Self { fragments };
        content.normalize(fallback);
        content
    }

    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    /// The full block text. Borrows when there is a single fragment.
    pub fn text(&self) -> Cow<'_, str> {
        match self.fragments.as_slice() {
            [single] => Cow::Borrowed(single.text.as_str()),
            fragments => Cow::Owned(fragments.iter().map(|f| f.text.as_str()).collect()),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.fragments.iter().map(|f| f.text.len()).sum()
    }

    pub fn grapheme_len(&self) -> usize {
        graphemes::grapheme_count(&self.text())
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    pub fn caret_at_start(&self) -> TextOffset {
        graphemes::offset_from_byte(&self.text(), 0)
    }

    pub fn caret_at_end(&self) -> TextOffset {
        let text = self.text();
        graphemes::offset_from_byte(&text, text.len())
    }

    /// The boundary before grapheme `index`; `None` past the end.
    pub fn offset_from_grapheme_index(&self, index: usize) -> Option<TextOffset> {
        graphemes::offset_from_grapheme_index(&self.text(), index)
    }

    /// The last boundary at or before `byte_offset` (clamped to the content).
    pub fn offset_from_byte(&self, byte_offset: usize) -> TextOffset {
        graphemes::offset_from_byte(&self.text(), byte_offset)
    }

    /// Re-derives `offset` against the current text, rejecting positions
    /// that are out of range or inside a cluster.
    pub fn resolve(&self, offset: TextOffset) -> Result<TextOffset, TextError> {
        let text = self.text();
        if offset.byte_offset > text.len() {
            return Err(TextError::OutOfRange {
                byte_offset: offset.byte_offset,
                len: text.len(),
            });
        }
        graphemes::offset_at_boundary(&text, offset.byte_offset)
            .ok_or(TextError::NotABoundary(offset.byte_offset))
    }

    pub fn next_offset(&self, offset: TextOffset) -> Option<TextOffset> {
        let current = self.resolve(offset).ok()?;
        if current.is_end() {
            return None;
        }
        Some(self.offset_from_byte(current.byte_offset + current.grapheme_len))
    }

    pub fn previous_offset(&self, offset: TextOffset) -> Option<TextOffset> {
        let current = self.resolve(offset).ok()?;
        if current.grapheme_offset == 0 {
            return None;
        }
        self.offset_from_grapheme_index(current.grapheme_offset - 1)
    }

    /// Style of the text immediately before `byte_offset`, or of the first
    /// fragment at the very start.
    pub fn style_at(&self, byte_offset: usize) -> TextStyle {
        let mut start = 0;
        for fragment in &self.fragments {
            let end = start + fragment.text.len();
            if byte_offset > start && byte_offset <= end {
                return fragment.style;
            }
            start = end;
        }
        self.fragments[0].style
    }

    /// Inserts `text` at `at`, returning the boundary after the new text.
    pub fn insert(&mut self, at: TextOffset, text: &str) -> Result<TextOffset, TextError> {
        let at = self.resolve(at)?;
        if text.is_empty() {
            return Ok(at);
        }

        let (index, local) = self.fragment_for_insert(at.byte_offset);
        self.fragments[index].text.insert_str(local, text);
        Ok(self.offset_from_byte(at.byte_offset + text.len()))
    }

    /// Splices whole fragments at `at`, preserving their styles.
    pub fn insert_content(
        &mut self,
        at: TextOffset,
        content: TextBlockContent,
    ) -> Result<TextOffset, TextError> {
        let at = self.resolve(at)?;
        let inserted = content.byte_len();
        self.splice_content(at.byte_offset, content)?;
        Ok(self.offset_from_byte(at.byte_offset + inserted))
    }

    /// Splices fragments at a char boundary without requiring a grapheme
    /// boundary. Restores text removed by [`delete_bytes`](Self::delete_bytes)
    /// or [`extract_content`](Self::extract_content) exactly.
    pub fn splice_content(
        &mut self,
        byte_offset: usize,
        content: TextBlockContent,
    ) -> Result<(), TextError> {
        let len = self.byte_len();
        if byte_offset > len {
            return Err(TextError::OutOfRange { byte_offset, len });
        }
        if !self.text().is_char_boundary(byte_offset) {
            return Err(TextError::NotABoundary(byte_offset));
        }
        let fallback = self.fragments[0].style;
        let index = self.split_at(byte_offset);
        self.fragments.splice(index..index, content.fragments);
        self.normalize(fallback);
        Ok(())
    }

    /// Removes the range between `a` and `b` (in either order) and returns
    /// it as independent content.
    pub fn extract_content(
        &mut self,
        a: TextOffset,
        b: TextOffset,
    ) -> Result<TextBlockContent, TextError> {
        let range = self.ordered_range(a, b)?;
        Ok(self.extract_bytes(range))
    }

    /// Copies the range between `a` and `b` (in either order). The source is
    /// untouched and the copy owns freshly created fragments.
    pub fn clone_content(&self, a: TextOffset, b: TextOffset) -> Result<TextBlockContent, TextError> {
        let range = self.ordered_range(a, b)?;
        let mut fragments = Vec::new();
        let mut start = 0;
        for fragment in &self.fragments {
            let end = start + fragment.text.len();
            let lo = range.start.max(start);
            let hi = range.end.min(end);
            if lo < hi {
                fragments.push(TextFragment::new(
                    &fragment.text[lo - start..hi - start],
                    fragment.style,
                ));
            }
            start = end;
        }
        Ok(Self::from_fragments(
            fragments,
            self.style_at(range.start),
        ))
    }

    /// Deep copy of the whole content with fresh fragment identities.
    pub fn deep_clone(&self) -> TextBlockContent {
        Self {
            fragments: self
                .fragments
                .iter()
                .map(|f| TextFragment::new(f.text.clone(), f.style))
                .collect(),
        }
    }

    /// Removes raw bytes regardless of grapheme boundaries. Both ends must
    /// still be char boundaries.
    pub fn delete_bytes(&mut self, range: Range<usize>) -> Result<TextBlockContent, TextError> {
        let text = self.text();
        let len = text.len();
        if range.start > range.end || range.end > len {
            return Err(TextError::OutOfRange {
                byte_offset: range.end,
                len,
            });
        }
        for edge in [range.start, range.end] {
            if !text.is_char_boundary(edge) {
                return Err(TextError::NotABoundary(edge));
            }
        }
        drop(text);
        Ok(self.extract_bytes(range))
    }

    /// Appends fragments to the end of the content (block merge).
    pub fn append_all(&mut self, fragments: impl IntoIterator<Item = TextFragment>) {
        let fallback = self.fragments[0].style;
        self.fragments.extend(fragments);
        self.normalize(fallback);
    }

    pub fn append_content(&mut self, content: TextBlockContent) {
        self.append_all(content.fragments);
    }

    /// Rewrites the style of every fragment in the range.
    pub fn update_style(
        &mut self,
        a: TextOffset,
        b: TextOffset,
        update: impl Fn(TextStyle) -> TextStyle,
    ) -> Result<(), TextError> {
        let range = self.ordered_range(a, b)?;
        let fallback = self.fragments[0].style;
        let start = self.split_at(range.start);
        let end = self.split_at(range.end);
        for fragment in &mut self.fragments[start..end] {
            fragment.style = update(fragment.style);
        }
        self.normalize(fallback);
        Ok(())
    }

    pub fn set_style(
        &mut self,
        a: TextOffset,
        b: TextOffset,
        style: TextStyle,
    ) -> Result<(), TextError> {
        self.update_style(a, b, |_| style)
    }

    fn ordered_range(&self, a: TextOffset, b: TextOffset) -> Result<Range<usize>, TextError> {
        let a = self.resolve(a)?.byte_offset;
        let b = self.resolve(b)?.byte_offset;
        Ok(a.min(b)..a.max(b))
    }

    fn extract_bytes(&mut self, range: Range<usize>) -> TextBlockContent {
        let fallback = self.style_at(range.start);
        let own_fallback = self.fragments[0].style;
        let start = self.split_at(range.start);
        let end = self.split_at(range.end);
        let removed: Vec<TextFragment> = self.fragments.drain(start..end).collect();
        self.normalize(own_fallback);
        Self::from_fragments(removed, fallback)
    }

    /// Picks the fragment that receives typed text: the one ending at or
    /// containing the boundary, so insertions continue the preceding style.
    fn fragment_for_insert(&self, byte_offset: usize) -> (usize, usize) {
        let mut start = 0;
        for (index, fragment) in self.fragments.iter().enumerate() {
            let end = start + fragment.text.len();
            if byte_offset > start && byte_offset <= end {
                return (index, byte_offset - start);
            }
            start = end;
        }
        (0, 0)
    }

    /// Ensures a fragment starts exactly at `byte_offset` and returns its
    /// index (`fragments.len()` for the end).
    fn split_at(&mut self, byte_offset: usize) -> usize {
        let mut start = 0;
        for index in 0..self.fragments.len() {
            if byte_offset == start {
                return index;
            }
            let len = self.fragments[index].text.len();
            if byte_offset < start + len {
                let fragment = &mut self.fragments[index];
                let tail = fragment.text.split_off(byte_offset - start);
                let style = fragment.style;
                self.fragments
                    .insert(index + 1, TextFragment::new(tail, style));
                return index + 1;
            }
            start += len;
        }
        self.fragments.len()
    }

    fn normalize(&mut self, fallback: TextStyle) {
        let mut merged: Vec<TextFragment> = Vec::with_capacity(self.fragments.len());
        for fragment in self.fragments.drain(..) {
            if fragment.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.style == fragment.style => last.text.push_str(&fragment.text),
                _ => merged.push(fragment),
            }
        }
        if merged.is_empty() {
            merged.push(TextFragment::new(String::new(), fallback));
        }
        self.fragments = merged;
    }
}
