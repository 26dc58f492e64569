//! In-memory host document.
//!
//! Holds paragraphs with their style, highlight, font and comments, plus content controls and the
//! current selection. It backs the terminal navigator and the tests, and records every applied
//! mutation in an [`EditPlan`].

use crate::document::{ContentControl, DocumentHost, FontFormat, Mutation, MutationOutcome};
use crate::edit_plan::EditPlan;
use crate::error::{HostError, MutationError};
use crate::paragraph::{Paragraph, StyledParagraph};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::Mutex;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
/// Full state of one stored paragraph.
pub struct StoredParagraph {
    /// Plain text.
    pub text: String,
    /// Style name.
    pub style: String,
    /// Highlight colour, if any.
    pub highlight: Option<String>,
    /// Accumulated character formatting.
    pub font: FontFormat,
    /// Comments attached, oldest first.
    pub comments: Vec<String>,
}

impl StoredParagraph {
    fn as_paragraph(&self, index: usize) -> Paragraph {
        Paragraph::from_style(index, self.text.clone(), &self.style)
    }
}

#[derive(Default)]
struct DocumentState {
    paragraphs: Vec<StoredParagraph>,
    controls: Vec<ContentControl>,
    selection: Option<(usize, usize)>,
    scrolled_to: Option<usize>,
    locked: HashSet<usize>,
    offline: bool,
    plan: EditPlan,
}

/// Host document held entirely in memory.
#[derive(Default)]
pub struct MemoryDocument {
    state: Mutex<DocumentState>,
}

impl MemoryDocument {
    #[must_use]
    /// Creates a document from styled paragraphs.
    pub fn new(paragraphs: Vec<StyledParagraph>) -> Self {
        let paragraphs = paragraphs
            .into_iter()
            .map(|p| StoredParagraph {
                text: p.text,
                style: p.style,
                ..StoredParagraph::default()
            })
            .collect();
        Self {
            state: Mutex::new(DocumentState {
                paragraphs,
                ..DocumentState::default()
            }),
        }
    }

    #[must_use]
    /// Creates a document from `(style, text)` pairs.
    pub fn from_pairs<S, T>(pairs: impl IntoIterator<Item = (S, T)>) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(style, text)| StyledParagraph::new(style, text))
                .collect(),
        )
    }

    /// Makes the host refuse every later change to paragraph `index`.
    pub async fn lock_paragraph(&self, index: usize) {
        self.state.lock().await.locked.insert(index);
    }

    /// Simulates losing (or regaining) the connection to the host.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Inserts a paragraph at `index`, shifting later paragraphs down.
    ///
    /// Stands in for the user editing the document between outline snapshots.
    pub async fn insert_paragraph(&self, index: usize, style: &str, text: &str) {
        let mut state = self.state.lock().await;
        let at = index.min(state.paragraphs.len());
        state.paragraphs.insert(
            at,
            StoredParagraph {
                text: text.to_string(),
                style: style.to_string(),
                ..StoredParagraph::default()
            },
        );
    }

    /// Removes the paragraph at `index`, if present.
    pub async fn remove_paragraph(&self, index: usize) {
        let mut state = self.state.lock().await;
        if index < state.paragraphs.len() {
            state.paragraphs.remove(index);
        }
    }

    /// Copies the stored paragraphs.
    pub async fn snapshot(&self) -> Vec<StoredParagraph> {
        self.state.lock().await.paragraphs.clone()
    }

    /// Current selection as an inclusive paragraph range.
    pub async fn selection(&self) -> Option<(usize, usize)> {
        self.state.lock().await.selection
    }

    /// Paragraph last scrolled into view.
    pub async fn scrolled_to(&self) -> Option<usize> {
        self.state.lock().await.scrolled_to
    }

    /// Copies the edits applied so far.
    pub async fn edit_plan(&self) -> EditPlan {
        self.state.lock().await.plan.clone()
    }
}

impl DocumentState {
    fn check_target(&self, index: usize) -> MutationOutcome {
        if index >= self.paragraphs.len() {
            return Err(MutationError::NotFound(index));
        }
        if self.locked.contains(&index) {
            return Err(MutationError::Rejected {
                index,
                reason: "paragraph is locked".to_string(),
            });
        }
        Ok(())
    }

    fn check_span(&self, start: usize, end: usize) -> MutationOutcome {
        if start > end || end >= self.paragraphs.len() {
            return Err(MutationError::NotFound(end.max(start)));
        }
        Ok(())
    }

    fn apply(&mut self, mutation: &Mutation) -> MutationOutcome {
        match mutation {
            Mutation::SetStyle { index, style } => {
                self.check_target(*index)?;
                self.paragraphs[*index].style.clone_from(style);
            }
            Mutation::SetHighlight { index, color } => {
                self.check_target(*index)?;
                self.paragraphs[*index].highlight.clone_from(color);
            }
            Mutation::SetFont { index, font } => {
                self.check_target(*index)?;
                let merged = self.paragraphs[*index].font.merged(font);
                self.paragraphs[*index].font = merged;
            }
            Mutation::InsertComment { index, text } => {
                self.check_target(*index)?;
                self.paragraphs[*index].comments.push(text.clone());
            }
            Mutation::ReplaceText { index, text } => {
                self.check_target(*index)?;
                self.paragraphs[*index].text.clone_from(text);
            }
            Mutation::SelectRange { start, end } => {
                self.check_span(*start, *end)?;
                self.selection = Some((*start, *end));
            }
            Mutation::ScrollIntoView { index } => {
                if *index >= self.paragraphs.len() {
                    return Err(MutationError::NotFound(*index));
                }
                self.scrolled_to = Some(*index);
            }
            Mutation::InsertContentControl {
                start,
                end,
                tag,
                title,
            } => {
                self.check_span(*start, *end)?;
                self.controls.push(ContentControl {
                    tag: tag.clone(),
                    title: title.clone(),
                    start: *start,
                    end: *end,
                });
            }
            Mutation::RemoveContentControl { tag } => {
                let before = self.controls.len();
                self.controls.retain(|c| &c.tag != tag);
                if self.controls.len() == before {
                    return Err(MutationError::Rejected {
                        index: 0,
                        reason: format!("no content control tagged {tag}"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentHost for MemoryDocument {
    async fn paragraphs(&self) -> Result<Vec<Paragraph>, HostError> {
        let state = self.state.lock().await;
        if state.offline {
            return Err(HostError::Unavailable("document is offline".to_string()));
        }
        Ok(state
            .paragraphs
            .iter()
            .enumerate()
            .map(|(index, p)| p.as_paragraph(index))
            .collect())
    }

    async fn content_controls(&self) -> Result<Vec<ContentControl>, HostError> {
        let state = self.state.lock().await;
        if state.offline {
            return Err(HostError::Unavailable("document is offline".to_string()));
        }
        Ok(state.controls.clone())
    }

    async fn execute(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, HostError> {
        let mut state = self.state.lock().await;
        if state.offline {
            return Err(HostError::Unavailable("document is offline".to_string()));
        }

        let mut outcomes = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            // Read before applying so a text replacement records the text it replaced.
            let target_text = mutation
                .target()
                .and_then(|i| state.paragraphs.get(i))
                .map(|p| p.text.clone())
                .unwrap_or_default();
            let outcome = state.apply(&mutation);
            if outcome.is_ok() {
                state.plan.record(mutation, target_text);
            } else {
                debug!("mutation {mutation:?} failed: {outcome:?}");
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
#[path = "tests/memory.rs"]
mod tests;
