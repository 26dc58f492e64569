//! Shared fixtures for unit tests.

use crate::paragraph::Paragraph;

/// Builds a paragraph sequence from `(heading_level, text)` pairs, indexed in order.
pub fn paragraphs(levels: &[(u8, &str)]) -> Vec<Paragraph> {
    levels
        .iter()
        .enumerate()
        .map(|(index, (level, text))| Paragraph {
            index,
            text: (*text).to_string(),
            heading_level: *level,
        })
        .collect()
}

/// Builds `(style, text)` pairs for an in-memory document from heading levels.
pub fn styled(levels: &[(u8, &str)]) -> Vec<(String, String)> {
    levels
        .iter()
        .map(|(level, text)| {
            let style = if *level == 0 {
                "Normal".to_string()
            } else {
                crate::paragraph::style_for_heading_level(*level)
            };
            (style, (*text).to_string())
        })
        .collect()
}
