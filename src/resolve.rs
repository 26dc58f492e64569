//! Resolves the paragraph range a heading's section spans.
//!
//! A section runs from the paragraph after its heading up to, but excluding, the next heading
//! whose level is equal or shallower. Deeper headings are part of the body. When no such heading
//! follows, the section runs to the end of the document.

use crate::error::ResolveError;
use crate::outline::Outline;
use crate::section::Section;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Inclusive range of paragraph indices.
///
/// `start > end` encodes an empty range; operations over it touch nothing.
pub struct SectionRange {
    /// First paragraph index (inclusive).
    pub start: usize,
    /// Last paragraph index (inclusive).
    pub end: usize,
}

impl SectionRange {
    #[must_use]
    /// Whether the range covers no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    #[must_use]
    /// Number of paragraphs covered.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    #[must_use]
    /// Whether paragraph `index` falls inside the range.
    pub fn contains(&self, index: usize) -> bool {
        !self.is_empty() && (self.start..=self.end).contains(&index)
    }

    /// Paragraph indices in increasing order.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

/// Resolves the body range of `heading`, excluding the heading paragraph itself.
///
/// # Errors
///
/// Returns [`ResolveError::StaleReference`] if `heading` is not an entry of `outline` or if its
/// index no longer fits inside `total_paragraph_count`.
pub fn resolve_section_range(
    heading: &Section,
    outline: &Outline,
    total_paragraph_count: usize,
) -> Result<SectionRange, ResolveError> {
    let end = section_end(heading, outline, total_paragraph_count)?;
    Ok(SectionRange {
        start: heading.index + 1,
        end,
    })
}

/// Resolves the range of `heading` including the heading paragraph.
///
/// # Errors
///
/// Same conditions as [`resolve_section_range`].
pub fn resolve_full_range(
    heading: &Section,
    outline: &Outline,
    total_paragraph_count: usize,
) -> Result<SectionRange, ResolveError> {
    let end = section_end(heading, outline, total_paragraph_count)?;
    Ok(SectionRange {
        start: heading.index,
        end,
    })
}

fn section_end(
    heading: &Section,
    outline: &Outline,
    total_paragraph_count: usize,
) -> Result<usize, ResolveError> {
    let stale = ResolveError::StaleReference {
        index: heading.index,
    };

    if heading.index >= total_paragraph_count {
        return Err(stale);
    }
    let position = outline
        .position_of(heading.index)
        .filter(|&pos| outline.sections[pos].title == heading.title)
        .ok_or(stale)?;
    // The outline's entry is authoritative for the level, not the caller's copy.
    let matched = &outline.sections[position];

    // An orphan section is a single paragraph with no body.
    if !matched.is_heading() {
        return Ok(matched.index);
    }

    let next_boundary = outline.sections[position + 1..]
        .iter()
        .find(|s| s.is_heading() && s.level <= matched.level);

    let end = match next_boundary {
        Some(next) => next.index - 1,
        None => total_paragraph_count - 1,
    };
    Ok(end.min(total_paragraph_count - 1))
}

#[cfg(test)]
#[path = "tests/resolve.rs"]
mod tests;
