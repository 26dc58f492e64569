//! Section representation for paragraph documents.
//!
//! A section is one entry of an outline: either a heading together with the body paragraphs
//! directly beneath it, or an orphan paragraph that precedes the first heading. Sections track
//! their place in the heading hierarchy through parent/subsection positions so that navigation
//! does not need to rescan the document.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Expand/collapse state of a heading in the navigator.
///
/// Toggling always succeeds and never touches the document by itself; it only decides whether
/// the next visibility effect applied to the section hides or shows its body.
pub enum Expansion {
    /// Body paragraphs are shown.
    #[default]
    Expanded,
    /// Body paragraphs are hidden.
    Collapsed,
}

impl Expansion {
    #[must_use]
    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }

    #[must_use]
    /// Whether the body is currently shown.
    pub fn is_expanded(self) -> bool {
        self == Self::Expanded
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Outline entry with its paragraph coordinates and hierarchy links.
pub struct Section {
    /// Paragraph index of the heading (or of the orphan paragraph itself).
    pub index: usize,
    /// Heading text, or the orphan paragraph text.
    pub title: String,
    /// Heading level 1..=6, or 0 for an orphan section.
    pub level: u8,
    /// Non-blank body paragraphs directly under this heading, in document order.
    pub body: Vec<usize>,
    /// Expand/collapse state, expanded on every fresh build.
    pub expansion: Expansion,
    /// Position of the enclosing heading in the outline.
    pub parent: Option<usize>,
    /// Positions of directly nested headings in the outline.
    pub subsections: Vec<usize>,
}

impl Section {
    #[must_use]
    /// Whether this entry is a heading rather than orphan body text.
    pub fn is_heading(&self) -> bool {
        self.level > 0
    }

    #[must_use]
    /// Identity used to recognise the same heading across outline rebuilds.
    pub fn key(&self) -> SectionKey {
        SectionKey {
            index: self.index,
            title: self.title.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Heading identity matched by paragraph index and text.
///
/// Indices shift whenever the document is edited, so an index alone cannot tell a moved heading
/// from a different one; pairing it with the text makes stale references detectable.
pub struct SectionKey {
    /// Paragraph index when the key was taken.
    pub index: usize,
    /// Heading text when the key was taken.
    pub title: String,
}
