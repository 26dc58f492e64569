//! Markdown format implementation using tree-sitter-md.
//!
//! Headings (ATX `#` syntax and setext underlines) become "Heading N" paragraphs; every other
//! paragraph block becomes a "Normal" paragraph. Code blocks, thematic breaks and HTML blocks are
//! not paragraphs and are left out.

use crate::formats::{Format, FormatError};
use crate::paragraph::{style_for_heading_level, StyledParagraph, DEFAULT_STYLE};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

/// Paragraph-producing blocks of the markdown block grammar.
const BLOCK_QUERY: &str = "
(atx_heading) @heading
(setext_heading) @setext
(paragraph) @paragraph
";

/// Tree-sitter queries for markdown headings and paragraphs.
pub struct MarkdownFormat;

impl MarkdownFormat {
    #[must_use]
    /// Markdown block grammar.
    pub fn language(&self) -> tree_sitter::Language {
        tree_sitter_md::LANGUAGE.into()
    }

    #[must_use]
    /// Query matching every block that yields a paragraph.
    pub fn block_query(&self) -> &'static str {
        BLOCK_QUERY
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &'static str {
        "md"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    fn parse(&self, source: &str) -> Result<Vec<StyledParagraph>, FormatError> {
        let language = self.language();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| FormatError::Language(e.to_string()))?;
        let tree = parser.parse(source, None).ok_or(FormatError::Parse)?;
        let query = Query::new(&language, self.block_query())
            .map_err(|e| FormatError::Query(e.to_string()))?;
        let names = query.capture_names();

        let bytes = source.as_bytes();
        let mut blocks: Vec<(usize, StyledParagraph)> = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), bytes);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let block = match names.get(capture.index as usize).copied() {
                    Some("heading") => atx_heading(node, bytes),
                    Some("setext") => setext_heading(node, bytes),
                    Some("paragraph") if !is_setext_title(node) => {
                        Some(StyledParagraph::new(DEFAULT_STYLE, block_text(node, bytes)))
                    }
                    _ => None,
                };
                if let Some(block) = block {
                    blocks.push((node.start_byte(), block));
                }
            }
        }

        blocks.sort_by_key(|(start, _)| *start);
        blocks.dedup_by_key(|(start, _)| *start);
        Ok(blocks.into_iter().map(|(_, block)| block).collect())
    }
}

fn atx_heading(node: Node, bytes: &[u8]) -> Option<StyledParagraph> {
    let mut walk = node.walk();
    let mut level = 0;
    let mut title = String::new();
    for child in node.children(&mut walk) {
        if let Some(n) = child
            .kind()
            .strip_prefix("atx_h")
            .and_then(|rest| rest.strip_suffix("_marker"))
            .and_then(|n| n.parse::<u8>().ok())
        {
            level = n;
        } else if child.kind() == "inline" {
            title = block_text(child, bytes);
        }
    }
    (level > 0).then(|| StyledParagraph::new(style_for_heading_level(level), title))
}

fn setext_heading(node: Node, bytes: &[u8]) -> Option<StyledParagraph> {
    let mut walk = node.walk();
    let mut level = 0;
    let mut title = String::new();
    for child in node.children(&mut walk) {
        match child.kind() {
            "setext_h1_underline" => level = 1,
            "setext_h2_underline" => level = 2,
            "paragraph" => title = block_text(child, bytes),
            _ => {}
        }
    }
    (level > 0).then(|| StyledParagraph::new(style_for_heading_level(level), title))
}

fn is_setext_title(node: Node) -> bool {
    node.parent()
        .is_some_and(|parent| parent.kind() == "setext_heading")
}

/// Node text with its lines trimmed and joined by single spaces.
fn block_text(node: Node, bytes: &[u8]) -> String {
    node.utf8_text(bytes)
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "../tests/markdown.rs"]
mod tests;
