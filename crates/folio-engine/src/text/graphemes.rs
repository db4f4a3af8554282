use unicode_segmentation::UnicodeSegmentation;

use super::TextOffset;

/// Number of extended grapheme clusters in `text`.
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// The boundary before grapheme `index`, or the end boundary when `index`
/// equals the cluster count. `None` past the end.
pub fn offset_from_grapheme_index(text: &str, index: usize) -> Option<TextOffset> {
    let mut count = 0;
    for (start, cluster) in text.grapheme_indices(true) {
        if count == index {
            return Some(TextOffset::new(start, index, cluster.len()));
        }
        count += 1;
    }
    (count == index).then(|| TextOffset::new(text.len(), count, 0))
}

/// The last grapheme boundary at or before `byte_offset`.
///
/// `byte_offset` is clamped to `0..=text.len()`.
pub fn offset_from_byte(text: &str, byte_offset: usize) -> TextOffset {
    let byte_offset = byte_offset.min(text.len());
    let mut floor = TextOffset::new(0, 0, 0);
    let mut count = 0;

    for (index, (start, cluster)) in text.grapheme_indices(true).enumerate() {
        if start > byte_offset {
            return floor;
        }
        floor = TextOffset::new(start, index, cluster.len());
        count = index + 1;
    }

    if byte_offset == text.len() {
        TextOffset::new(text.len(), count, 0)
    } else {
        floor
    }
}

/// The boundary exactly at `byte_offset`, if there is one.
pub fn offset_at_boundary(text: &str, byte_offset: usize) -> Option<TextOffset> {
    if byte_offset > text.len() {
        return None;
    }
    let floor = offset_from_byte(text, byte_offset);
    (floor.byte_offset == byte_offset).then_some(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_boundaries() {
        let text = "abc";
        assert_eq!(grapheme_count(text), 3);
        assert_eq!(
            offset_from_grapheme_index(text, 1),
            Some(TextOffset::new(1, 1, 1))
        );
        assert_eq!(
            offset_from_grapheme_index(text, 3),
            Some(TextOffset::new(3, 3, 0))
        );
        assert_eq!(offset_from_grapheme_index(text, 4), None);
    }

    #[test]
    fn combining_mark_is_one_cluster() {
        let text = "a\u{0301}b";
        assert_eq!(grapheme_count(text), 2);
        assert_eq!(
            offset_from_grapheme_index(text, 1),
            Some(TextOffset::new(3, 1, 1))
        );
        // Byte 1 sits inside the first cluster
        assert_eq!(offset_at_boundary(text, 1), None);
        assert_eq!(offset_from_byte(text, 1), TextOffset::new(0, 0, 3));
    }

    #[test]
    fn zwj_emoji_sequence_is_one_cluster() {
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        let text = format!("x{family}y");
        assert_eq!(grapheme_count(&text), 3);
        let end_of_family = 1 + family.len();
        assert_eq!(
            offset_at_boundary(&text, end_of_family),
            Some(TextOffset::new(end_of_family, 2, 1))
        );
    }

    #[test]
    fn empty_text_has_single_boundary() {
        assert_eq!(grapheme_count(""), 0);
        assert_eq!(
            offset_from_grapheme_index("", 0),
            Some(TextOffset::new(0, 0, 0))
        );
        assert_eq!(offset_from_byte("", 10), TextOffset::new(0, 0, 0));
    }

    #[test]
    fn byte_offset_is_clamped() {
        assert_eq!(offset_from_byte("ab", 99), TextOffset::new(2, 2, 0));
    }
}
