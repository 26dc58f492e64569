//! Builds the heading outline of a document from its flat paragraph sequence.
//!
//! The outline is a snapshot: it is rebuilt from scratch whenever the document may have changed
//! and is never patched in place. Every non-blank paragraph lands in exactly one place, either as
//! a section's own index or in exactly one heading's body.

use crate::error::OutlineError;
use crate::paragraph::{Paragraph, MAX_HEADING_LEVEL};
use crate::section::{Expansion, Section, SectionKey};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Ordered decomposition of a document into headings and orphan sections.
pub struct Outline {
    /// Entries in document order.
    pub sections: Vec<Section>,
    /// Number of paragraphs in the document the outline was built from.
    pub paragraph_count: usize,
}

/// Builds an outline with a single left-to-right scan.
///
/// Heading paragraphs open a new section and close the previous heading's body. Non-blank body
/// paragraphs join the open heading, or become orphan sections when no heading has been seen yet.
/// Whitespace-only body paragraphs contribute no entry.
///
/// # Errors
///
/// Rejects the whole sequence when an index is out of range, repeated or out of document order,
/// or when a heading level exceeds 6.
pub fn build_outline(paragraphs: &[Paragraph]) -> Result<Outline, OutlineError> {
    validate(paragraphs)?;

    let mut sections: Vec<Section> = Vec::new();
    let mut current_heading: Option<usize> = None;
    // Positions of the open headings, shallowest first.
    let mut ancestors: Vec<usize> = Vec::new();

    for paragraph in paragraphs {
        if paragraph.is_heading() {
            while let Some(&top) = ancestors.last() {
                if sections[top].level >= paragraph.heading_level {
                    ancestors.pop();
                } else {
                    break;
                }
            }

            let position = sections.len();
            let parent = ancestors.last().copied();
            if let Some(parent) = parent {
                sections[parent].subsections.push(position);
            }

            sections.push(Section {
                index: paragraph.index,
                title: paragraph.text.trim().to_string(),
                level: paragraph.heading_level,
                body: Vec::new(),
                expansion: Expansion::Expanded,
                parent,
                subsections: Vec::new(),
            });
            ancestors.push(position);
            current_heading = Some(position);
        } else if paragraph.is_blank() {
            continue;
        } else if let Some(heading) = current_heading {
            sections[heading].body.push(paragraph.index);
        } else {
            sections.push(Section {
                index: paragraph.index,
                title: paragraph.text.trim().to_string(),
                level: 0,
                body: Vec::new(),
                expansion: Expansion::Expanded,
                parent: None,
                subsections: Vec::new(),
            });
        }
    }

    debug!(
        "built outline: {} entries from {} paragraphs",
        sections.len(),
        paragraphs.len()
    );

    Ok(Outline {
        sections,
        paragraph_count: paragraphs.len(),
    })
}

fn validate(paragraphs: &[Paragraph]) -> Result<(), OutlineError> {
    let count = paragraphs.len();
    let mut previous: Option<usize> = None;

    for (expected, paragraph) in paragraphs.iter().enumerate() {
        let index = paragraph.index;
        if index >= count {
            return Err(OutlineError::IndexOutOfRange { index, count });
        }
        if previous == Some(index) {
            return Err(OutlineError::DuplicateIndex { index });
        }
        if index != expected {
            return Err(OutlineError::OutOfOrder {
                index,
                previous: previous.unwrap_or(0),
                expected,
            });
        }
        if paragraph.heading_level > MAX_HEADING_LEVEL {
            return Err(OutlineError::InvalidLevel {
                index,
                level: paragraph.heading_level,
            });
        }
        previous = Some(index);
    }

    Ok(())
}

impl Outline {
    #[must_use]
    /// Whether the document contains at least one heading.
    ///
    /// An outline without headings is a defined state that the navigator renders as "no
    /// headings", not an error.
    pub fn has_headings(&self) -> bool {
        self.sections.iter().any(Section::is_heading)
    }

    /// Heading entries in document order, skipping orphan sections.
    pub fn headings(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_heading())
    }

    /// Orphan sections (body text before the first heading).
    pub fn orphans(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| !s.is_heading())
    }

    #[must_use]
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    /// Whether the outline has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    /// Outline position of the entry whose own paragraph index is `index`.
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.sections
            .binary_search_by_key(&index, |s| s.index)
            .ok()
    }

    #[must_use]
    /// Entry whose own paragraph index is `index`.
    pub fn section_at(&self, index: usize) -> Option<&Section> {
        self.position_of(index).map(|pos| &self.sections[pos])
    }

    #[must_use]
    /// Outline position of the heading matching `key` by both index and text.
    pub fn find(&self, key: &SectionKey) -> Option<usize> {
        self.position_of(key.index)
            .filter(|&pos| self.sections[pos].title == key.title)
    }

    #[must_use]
    /// Whether the paragraph at `index` is a heading in this snapshot.
    pub fn is_heading_paragraph(&self, index: usize) -> bool {
        self.section_at(index).is_some_and(Section::is_heading)
    }

    #[must_use]
    /// Outline position of the entry that contains paragraph `index`, as its own index or body.
    pub fn owner_of(&self, index: usize) -> Option<usize> {
        let pos = match self
            .sections
            .binary_search_by_key(&index, |s| s.index)
        {
            Ok(pos) => return Some(pos),
            Err(0) => return None,
            Err(insert) => insert - 1,
        };
        self.sections[pos].body.contains(&index).then_some(pos)
    }

    // --- Navigation ---

    #[must_use]
    /// Position of the enclosing heading.
    pub fn parent(&self, position: usize) -> Option<usize> {
        self.sections.get(position)?.parent
    }

    #[must_use]
    /// Position of the first directly nested heading.
    pub fn first_child(&self, position: usize) -> Option<usize> {
        self.sections.get(position)?.subsections.first().copied()
    }

    #[must_use]
    /// Finds the next entry at a deeper level, preferring direct subsections.
    pub fn next_descendant(&self, position: usize) -> Option<usize> {
        let current = self.sections.get(position)?;
        if let Some(first) = current.subsections.first() {
            return Some(*first);
        }
        ((position + 1)..self.sections.len()).find(|&i| self.sections[i].level > current.level)
    }

    #[must_use]
    /// Finds the next entry at the same level without leaving the parent.
    pub fn next_sibling(&self, position: usize) -> Option<usize> {
        let level = self.sections.get(position)?.level;
        for i in (position + 1)..self.sections.len() {
            if self.sections[i].level == level {
                return Some(i);
            }
            if self.sections[i].level < level {
                break;
            }
        }
        None
    }

    #[must_use]
    /// Finds the previous entry at the same level without leaving the parent.
    pub fn prev_sibling(&self, position: usize) -> Option<usize> {
        let level = self.sections.get(position)?.level;
        for i in (0..position).rev() {
            if self.sections[i].level == level {
                return Some(i);
            }
            if self.sections[i].level < level {
                break;
            }
        }
        None
    }

    #[must_use]
    /// First entry in the outline.
    pub fn first(&self) -> Option<usize> {
        (!self.sections.is_empty()).then_some(0)
    }

    #[must_use]
    /// Last entry in the outline.
    pub fn last(&self) -> Option<usize> {
        self.sections.len().checked_sub(1)
    }

    #[must_use]
    /// First entry sharing the level of `position`.
    pub fn first_at_level(&self, position: usize) -> Option<usize> {
        let level = self.sections.get(position)?.level;
        self.sections.iter().position(|s| s.level == level)
    }

    #[must_use]
    /// Last entry sharing the level of `position`.
    pub fn last_at_level(&self, position: usize) -> Option<usize> {
        let level = self.sections.get(position)?.level;
        self.sections.iter().rposition(|s| s.level == level)
    }

    #[must_use]
    /// Heading titles from the outermost ancestor down to `position`.
    pub fn breadcrumb(&self, position: usize) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut current = self.sections.get(position).map(|_| position);
        while let Some(pos) = current {
            parts.push(self.sections[pos].title.as_str());
            current = self.sections[pos].parent;
        }
        parts.reverse();
        parts
    }
}

#[cfg(test)]
#[path = "tests/outline.rs"]
mod tests;
