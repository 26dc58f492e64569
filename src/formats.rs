//! Format trait and implementations for paragraph sources.
//!
//! A format turns file contents into styled paragraphs in document order, the same shape a word
//! processor hands out. Heading levels are carried by style names ("Heading 1" and so on).

use crate::paragraph::StyledParagraph;
use std::path::Path;

pub mod json;
pub mod markdown;

/// Failure to read paragraphs from a source file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The tree-sitter grammar could not be loaded.
    #[error("failed to load grammar: {0}")]
    Language(String),

    /// A built-in query did not compile against the grammar.
    #[error("invalid query: {0}")]
    Query(String),

    /// The parser produced no tree.
    #[error("failed to parse document")]
    Parse,

    /// A JSON record could not be read.
    #[error("invalid record on line {line}: {message}")]
    Json {
        /// 1-based line number, or 1 for a whole-array document.
        line: usize,
        /// Deserializer message.
        message: String,
    },

    /// No format handles the requested name or extension.
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// Source of styled paragraphs.
pub trait Format {
    /// Short name used on the command line.
    fn name(&self) -> &'static str;

    /// File suffixes handled by this format, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Reads `source` into paragraphs in document order.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed.
    fn parse(&self, source: &str) -> Result<Vec<StyledParagraph>, FormatError>;
}

/// Every supported format.
#[must_use]
pub fn all_formats() -> Vec<Box<dyn Format>> {
    vec![Box::new(markdown::MarkdownFormat), Box::new(json::JsonFormat)]
}

/// Every extension some format reads, in format order.
#[must_use]
pub fn supported_extensions() -> Vec<String> {
    all_formats()
        .iter()
        .flat_map(|format| format.extensions().iter().map(|e| (*e).to_string()))
        .collect()
}

/// Format named `name` (or one of its extensions).
///
/// # Errors
///
/// Returns [`FormatError::Unsupported`] for unknown names.
pub fn format_by_name(name: &str) -> Result<Box<dyn Format>, FormatError> {
    let name = name.trim_start_matches('.').to_ascii_lowercase();
    all_formats()
        .into_iter()
        .find(|f| f.name() == name || f.extensions().contains(&name.as_str()))
        .ok_or(FormatError::Unsupported(name))
}

/// Format for `path`, chosen by its extension.
///
/// # Errors
///
/// Returns [`FormatError::Unsupported`] when the extension is missing or unknown.
pub fn format_for_path(path: &Path) -> Result<Box<dyn Format>, FormatError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| FormatError::Unsupported(path.display().to_string()))?;
    format_by_name(ext)
}
