//! Content-control tags.
//!
//! Hosts store a content control's classification as a plain string. Inside the crate a tag is
//! always a [`ControlTag`]; this module is the only place that reads or writes the string form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CRITIQUE_PREFIX: &str = "critique-";
const PARAGRAPH_PREFIX: &str = "para-";
const SECTION_PREFIX: &str = "section-";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Classification of a content control.
pub enum ControlTag {
    /// Review comment wrapper, numbered per session.
    Critique {
        /// Session-unique critique number.
        id: u32,
    },
    /// Wrapper around a single paragraph.
    Paragraph {
        /// Paragraph index when the control was inserted.
        index: usize,
    },
    /// Wrapper around a collapsed section body.
    Section {
        /// Paragraph index of the section heading.
        index: usize,
    },
    /// Tag written by something else; preserved verbatim.
    Other(String),
}

impl fmt::Display for ControlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critique { id } => write!(f, "{CRITIQUE_PREFIX}{id}"),
            Self::Paragraph { index } => write!(f, "{PARAGRAPH_PREFIX}{index}"),
            Self::Section { index } => write!(f, "{SECTION_PREFIX}{index}"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for ControlTag {
    type Err = std::convert::Infallible;

    /// Never fails: anything without a recognised prefix and numeric suffix is `Other`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(raw))
    }
}

impl ControlTag {
    #[must_use]
    /// Classifies a raw tag string.
    pub fn parse(raw: &str) -> Self {
        if let Some(id) = numeric_suffix(raw, CRITIQUE_PREFIX) {
            return Self::Critique { id };
        }
        if let Some(index) = numeric_suffix(raw, PARAGRAPH_PREFIX) {
            return Self::Paragraph { index };
        }
        if let Some(index) = numeric_suffix(raw, SECTION_PREFIX) {
            return Self::Section { index };
        }
        Self::Other(raw.to_string())
    }

    #[must_use]
    /// Whether the tag marks a critique.
    pub fn is_critique(&self) -> bool {
        matches!(self, Self::Critique { .. })
    }
}

fn numeric_suffix<T: FromStr>(raw: &str, prefix: &str) -> Option<T> {
    let digits = raw.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only the canonical form parses, so `Display` gives back the same string.
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

impl Serialize for ControlTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ControlTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
#[path = "tests/tag.rs"]
mod tests;
