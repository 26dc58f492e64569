//! JSON paragraph records, as exported from a word processor.
//!
//! Accepts either one array of `{"style": ..., "text": ...}` objects or one such object per line.
//! A missing `style` means body text.

use crate::formats::{Format, FormatError};
use crate::paragraph::StyledParagraph;

/// Paragraph records in JSON or newline-delimited JSON.
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json", "jsonl", "ndjson"]
    }

    fn parse(&self, source: &str) -> Result<Vec<StyledParagraph>, FormatError> {
        if source.trim_start().starts_with('[') {
            return serde_json::from_str(source).map_err(|e| FormatError::Json {
                line: e.line(),
                message: e.to_string(),
            });
        }

        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| FormatError::Json {
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/json.rs"]
mod tests;
