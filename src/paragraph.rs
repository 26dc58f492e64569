//! Paragraphs as the host document reports them.
//!
//! A paragraph is the unit every outline and section operation works in. The host tags each one
//! with a style name; heading styles carry a level from 1 to 6 and everything else is body text.

use serde::{Deserialize, Serialize};

/// Deepest heading level a host style can express.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Style name of ordinary body text.
pub const DEFAULT_STYLE: &str = "Normal";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// One paragraph of the host document, read-only to the outline core.
pub struct Paragraph {
    /// Position in document order, starting at zero.
    pub index: usize,
    /// Plain text content.
    pub text: String,
    /// Heading level from the paragraph style (0 for body text).
    pub heading_level: u8,
}

impl Paragraph {
    #[must_use]
    /// Creates a paragraph, deriving its heading level from the style name.
    pub fn from_style(index: usize, text: impl Into<String>, style: &str) -> Self {
        Self {
            index,
            text: text.into(),
            heading_level: heading_level_for_style(style),
        }
    }

    #[must_use]
    /// Whether the paragraph is styled as a heading.
    pub fn is_heading(&self) -> bool {
        self.heading_level > 0
    }

    #[must_use]
    /// Whether the text is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Paragraph text paired with the host style name, as read from a source file.
pub struct StyledParagraph {
    /// Style name, e.g. `"Normal"` or `"Heading 2"`.
    #[serde(default = "normal_style")]
    pub style: String,
    /// Plain text content.
    pub text: String,
}

impl StyledParagraph {
    #[must_use]
    /// Creates a styled paragraph.
    pub fn new(style: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            text: text.into(),
        }
    }
}

fn normal_style() -> String {
    DEFAULT_STYLE.to_string()
}

#[must_use]
/// Maps a style name to a heading level, or 0 when the style is not a heading style.
///
/// Accepts the display names (`"Heading 1"` to `"Heading 6"`) and the built-in identifiers
/// (`"heading1"` to `"heading6"`), ignoring case.
pub fn heading_level_for_style(style: &str) -> u8 {
    let lowered = style.trim().to_ascii_lowercase();
    let Some(rest) = lowered.strip_prefix("heading") else {
        return 0;
    };
    match rest.trim_start().parse::<u8>() {
        Ok(level) if (1..=MAX_HEADING_LEVEL).contains(&level) => level,
        _ => 0,
    }
}

#[must_use]
/// Style name a host uses for a heading of the given level.
pub fn style_for_heading_level(level: u8) -> String {
    format!("Heading {level}")
}

#[cfg(test)]
#[path = "tests/paragraph.rs"]
mod tests;
