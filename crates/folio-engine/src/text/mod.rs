//! Grapheme-aware text content backing text blocks.
//!
//! A [`TextBlockContent`] is an ordered run of styled [`TextFragment`]s.
//! Storage is flat UTF-8 per fragment, but every public position is a
//! [`TextOffset`] sitting on an extended grapheme cluster boundary, so
//! combining sequences and emoji clusters behave as single characters.

mod content;
pub mod graphemes;
mod offset;
mod style;

pub use content::{FragmentId, TextBlockContent, TextFragment};
pub use offset::TextOffset;
pub use style::{StyleFlag, TextStyle};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("offset {byte_offset} is outside content of {len} bytes")]
    OutOfRange { byte_offset: usize, len: usize },
    #[error("offset {0} is not on a grapheme boundary")]
    NotABoundary(usize),
    #[error("unknown style flag: {0}")]
    UnknownStyle(String),
}
