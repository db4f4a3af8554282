use serde::{Deserialize, Serialize};

use super::TextError;

/// A single formatting flag of a [`TextStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleFlag {
    Bold,
    Italic,
    Underline,
    Code,
}

impl StyleFlag {
    pub const ALL: [StyleFlag; 4] = [
        StyleFlag::Bold,
        StyleFlag::Italic,
        StyleFlag::Underline,
        StyleFlag::Code,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleFlag::Bold => "bold",
            StyleFlag::Italic => "italic",
            StyleFlag::Underline => "underline",
            StyleFlag::Code => "code",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

/// Style tag attached to every text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
}

impl TextStyle {
    pub const PLAIN: TextStyle = TextStyle {
        bold: false,
        italic: false,
        underline: false,
        code: false,
    };

    pub fn contains(self, flag: StyleFlag) -> bool {
        match flag {
            StyleFlag::Bold => self.bold,
            StyleFlag::Italic => self.italic,
            StyleFlag::Underline => self.underline,
            StyleFlag::Code => self.code,
        }
    }

    #[must_use]
    pub fn with(mut self, flag: StyleFlag, on: bool) -> Self {
        match flag {
            StyleFlag::Bold => self.bold = on,
            StyleFlag::Italic => self.italic = on,
            StyleFlag::Underline => self.underline = on,
            StyleFlag::Code => self.code = on,
        }
        self
    }

    pub fn is_plain(self) -> bool {
        self == Self::PLAIN
    }

    /// Comma separated flag names, empty for plain text.
    pub fn to_attribute(self) -> String {
        StyleFlag::ALL
            .into_iter()
            .filter(|flag| self.contains(*flag))
            .map(StyleFlag::name)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn from_attribute(value: &str) -> Result<Self, TextError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(Self::PLAIN, |style, name| {
                StyleFlag::from_name(name)
                    .map(|flag| style.with(flag, true))
                    .ok_or_else(|| TextError::UnknownStyle(name.to_string()))
            })
    }
}
