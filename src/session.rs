//! Session state shared by the navigator's event handlers.
//!
//! The outline in here is a snapshot and is thrown away on every refresh. What survives a refresh
//! is the user's view of it: which headings are collapsed (matched by index and text), the cursor,
//! and the critiques added so far. Handlers receive this object explicitly; there is no global
//! state.

use crate::document::DocumentHost;
use crate::error::OperationError;
use crate::operations::{Effect, HeadingScope, OperationReport, SectionOperations};
use crate::outline::Outline;
use crate::resolve::SectionRange;
use crate::section::{Expansion, Section, SectionKey};
use crate::tag::ControlTag;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// Review note attached to one paragraph through a tagged content control.
pub struct Critique {
    /// Session-unique number, also encoded in the control tag.
    pub id: u32,
    /// Paragraph the critique wraps.
    pub paragraph_index: usize,
    /// Comment text.
    pub text: String,
}

impl Critique {
    #[must_use]
    /// Tag of the content control wrapping this critique.
    pub fn tag(&self) -> ControlTag {
        ControlTag::Critique { id: self.id }
    }
}

#[derive(Clone, Debug)]
/// Trailing-edge debounce for selection-change refreshes.
///
/// Every selection change re-arms the timer; a refresh fires once the selection has been quiet
/// for `wait`.
pub struct RefreshDebounce {
    wait: Duration,
    last_event: Option<Instant>,
}

impl RefreshDebounce {
    #[must_use]
    /// Creates a debounce that waits `wait` after the latest event.
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_event: None,
        }
    }

    /// Records a selection-change event at `now`.
    pub fn on_selection_changed(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    /// Returns `true` once per quiet period, when a refresh is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_event {
            Some(last) if now.saturating_duration_since(last) >= self.wait => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    /// Whether an event is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }
}

/// Navigator session: outline snapshot, cursor, expand/collapse view and critiques.
pub struct SessionState {
    /// Latest outline snapshot.
    pub outline: Outline,
    /// Cursor position in the outline.
    pub current: usize,
    /// Critiques added during this session.
    pub critiques: Vec<Critique>,
    /// Status feedback for the user.
    pub message: Option<String>,
    /// Selection-change refresh timer.
    pub debounce: RefreshDebounce,
    next_critique_id: u32,
}

impl SessionState {
    #[must_use]
    /// Starts a session on `outline`.
    pub fn new(outline: Outline, refresh_wait: Duration) -> Self {
        Self {
            outline,
            current: 0,
            critiques: Vec::new(),
            message: None,
            debounce: RefreshDebounce::new(refresh_wait),
            next_critique_id: 1,
        }
    }

    #[must_use]
    /// Section under the cursor.
    pub fn current_section(&self) -> Option<&Section> {
        self.outline.sections.get(self.current)
    }

    #[must_use]
    /// Identity of the section under the cursor.
    pub fn current_key(&self) -> Option<SectionKey> {
        self.current_section().map(Section::key)
    }

    /// Moves the cursor when `target` is a valid position.
    pub fn jump(&mut self, target: Option<usize>) {
        if let Some(position) = target.filter(|&p| p < self.outline.len()) {
            self.current = position;
        }
    }

    /// Replaces the outline snapshot, carrying over collapsed state and the cursor by identity.
    ///
    /// Headings whose index or text changed come back expanded: their identity no longer matches.
    pub fn refresh(&mut self, mut outline: Outline) {
        let collapsed: HashMap<SectionKey, Expansion> = self
            .outline
            .sections
            .iter()
            .filter(|s| !s.expansion.is_expanded())
            .map(|s| (s.key(), s.expansion))
            .collect();
        let cursor = self.current_key();

        for section in &mut outline.sections {
            if let Some(expansion) = collapsed.get(&section.key()) {
                section.expansion = *expansion;
            }
        }

        self.current = cursor
            .and_then(|key| outline.find(&key))
            .unwrap_or_else(|| self.current.min(outline.len().saturating_sub(1)));
        debug!(
            "session refreshed: {} entries, {} collapsed carried over",
            outline.len(),
            collapsed.len()
        );
        self.outline = outline;
    }

    /// Rebuilds the outline from the host and refreshes the session with it.
    ///
    /// # Errors
    ///
    /// Returns a host or malformed-input error; the previous outline is kept in that case.
    pub async fn reload<H: DocumentHost + ?Sized>(
        &mut self,
        ops: &SectionOperations<'_, H>,
    ) -> Result<(), OperationError> {
        let outline = ops.outline().await?;
        self.refresh(outline);
        Ok(())
    }

    /// Flips the expand/collapse state at `position` and returns the new state.
    ///
    /// This only changes the session view; [`Self::toggle_section`] also updates the document.
    pub fn toggle(&mut self, position: usize) -> Option<Expansion> {
        let section = self.outline.sections.get_mut(position)?;
        section.expansion = section.expansion.toggled();
        Some(section.expansion)
    }

    /// Toggles the section at `position` and hides or shows its body in the document.
    ///
    /// Orphan sections have nothing to collapse and report nothing affected. On a stale
    /// reference the outline is rebuilt before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the operation error; the toggle is reverted when the document was not changed.
    pub async fn toggle_section<H: DocumentHost + ?Sized>(
        &mut self,
        ops: &SectionOperations<'_, H>,
        position: usize,
    ) -> Result<OperationReport, OperationError> {
        let Some(section) = self.outline.sections.get(position) else {
            return Ok(OperationReport::default());
        };
        if !section.is_heading() {
            return Ok(OperationReport::default());
        }
        let key = section.key();
        let Some(expansion) = self.toggle(position) else {
            return Ok(OperationReport::default());
        };

        match ops.set_expansion(&key, expansion).await {
            Ok(report) => {
                self.message = Some(format!(
                    "{} {} paragraph(s)",
                    if expansion.is_expanded() { "Showed" } else { "Hid" },
                    report.affected
                ));
                Ok(report)
            }
            Err(err) => {
                self.toggle(position);
                if err.is_stale() {
                    info!("stale heading {key:?}; rebuilding outline");
                    if let Err(reload_err) = self.reload(ops).await {
                        debug!("reload after stale reference failed: {reload_err}");
                    }
                }
                self.message = Some(format!("Error: {err}"));
                Err(err)
            }
        }
    }

    /// Wraps paragraph `paragraph_index` in a critique control and attaches `text` as a comment.
    ///
    /// # Errors
    ///
    /// Returns a host error if the batch could not be flushed, or a stale reference if the
    /// paragraph no longer exists.
    pub async fn add_critique<H: DocumentHost + ?Sized>(
        &mut self,
        ops: &SectionOperations<'_, H>,
        paragraph_index: usize,
        text: &str,
    ) -> Result<Critique, OperationError> {
        let critique = Critique {
            id: self.next_critique_id,
            paragraph_index,
            text: text.to_string(),
        };
        let range = SectionRange {
            start: paragraph_index,
            end: paragraph_index,
        };

        let report = ops
            .apply_to_section(
                range,
                &Effect::Comment(text.to_string()),
                HeadingScope::IncludeHeadings,
            )
            .await?;
        if !report.is_complete() {
            return Err(OperationError::Rejected {
                index: paragraph_index,
            });
        }
        if !ops.wrap_range(range, critique.tag(), "Critique").await? {
            return Err(OperationError::Rejected {
                index: paragraph_index,
            });
        }

        self.next_critique_id += 1;
        self.critiques.push(critique.clone());
        info!(
            "added critique {} on paragraph {paragraph_index}",
            critique.id
        );
        Ok(critique)
    }

    /// Removes every critique control added in this session.
    ///
    /// Returns how many controls were removed. A critique whose control is already gone is
    /// forgotten without counting.
    ///
    /// # Errors
    ///
    /// Returns a host error if a batch could not be flushed. Critiques not yet removed stay
    /// recorded so the call can be retried.
    pub async fn clear_critiques<H: DocumentHost + ?Sized>(
        &mut self,
        ops: &SectionOperations<'_, H>,
    ) -> Result<usize, OperationError> {
        let mut removed = 0;
        while let Some(critique) = self.critiques.first() {
            let tag = critique.tag();
            if ops.remove_control(tag).await? {
                removed += 1;
            } else {
                warn!("critique {} had no control to remove", critique.id);
            }
            self.critiques.remove(0);
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "tests/session.rs"]
mod tests;
