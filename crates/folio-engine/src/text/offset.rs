/// A grapheme boundary inside a [`TextBlockContent`](super::TextBlockContent).
///
/// Offsets are only meaningful for the content that produced them. The byte
/// offset is authoritative when an offset is handed back to the content; the
/// grapheme fields are recomputed on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextOffset {
    /// UTF-8 byte offset of the boundary.
    pub byte_offset: usize,
    /// Number of grapheme clusters before the boundary.
    pub grapheme_offset: usize,
    /// Byte length of the cluster starting at the boundary; 0 at the end.
    pub grapheme_len: usize,
}

impl TextOffset {
    pub const fn new(byte_offset: usize, grapheme_offset: usize, grapheme_len: usize) -> Self {
        Self {
            byte_offset,
            grapheme_offset,
            grapheme_len,
        }
    }

    /// True when no cluster follows this boundary.
    #[must_use]
    pub fn is_end(self) -> bool {
        self.grapheme_len == 0
    }
}

impl PartialOrd for TextOffset {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextOffset {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.byte_offset
            .cmp(&other.byte_offset)
            .then(self.grapheme_offset.cmp(&other.grapheme_offset))
            .then(self.grapheme_len.cmp(&other.grapheme_len))
    }
}
