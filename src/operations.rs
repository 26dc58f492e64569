//! Section operations: the only part of the core that changes the host document.
//!
//! An operation turns a resolved [`SectionRange`] and an [`Effect`] into one host mutation per
//! paragraph, queued in increasing index order and flushed as a single batch. Each mutation
//! succeeds or fails on its own; the report lists what was touched and what was not, and nothing
//! already applied is rolled back.

use crate::document::{run_batch, DocumentHost, FontFormat, Mutation, MutationOutcome};
use crate::error::OperationError;
use crate::outline::{build_outline, Outline};
use crate::paragraph::Paragraph;
use crate::resolve::{resolve_full_range, resolve_section_range, SectionRange};
use crate::section::{Expansion, SectionKey};
use crate::tag::ControlTag;
use log::{debug, info, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Whether a section body is shown or hidden.
pub enum Visibility {
    /// Body hidden via the hidden style.
    Hidden,
    /// Body restored to the visible style.
    Visible,
}

impl From<Expansion> for Visibility {
    fn from(expansion: Expansion) -> Self {
        match expansion {
            Expansion::Expanded => Self::Visible,
            Expansion::Collapsed => Self::Hidden,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Change to apply to every paragraph of a range.
pub enum Effect {
    /// Hide or show through a style toggle.
    SetVisibility(Visibility),
    /// Set (or clear, with `None`) the highlight colour.
    Highlight(Option<String>),
    /// Overlay character formatting.
    Font(FontFormat),
    /// Attach a comment.
    Comment(String),
    /// Select the range in the host and scroll its start into view.
    Select,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Which paragraphs of a range an effect covers.
pub enum HeadingScope {
    /// Visibility skips headings; every other effect covers them.
    #[default]
    Default,
    /// Cover heading paragraphs too.
    IncludeHeadings,
    /// Leave heading paragraphs untouched.
    SkipHeadings,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// How much of a heading's section an operation covers.
pub enum Extent {
    /// Body only, heading excluded.
    #[default]
    Body,
    /// Heading through the end of its body.
    Full,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
/// What an operation touched, for UI feedback.
pub struct OperationReport {
    /// Paragraphs changed successfully.
    pub affected: usize,
    /// Paragraphs whose mutation the host rejected, in increasing order.
    pub failed: Vec<usize>,
}

impl OperationReport {
    #[must_use]
    /// Whether every attempted mutation succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Style names used for the hide/show toggle.
pub struct VisibilityStyles {
    /// Style applied to hide a paragraph.
    pub hidden: String,
    /// Style restored to show it again.
    pub visible: String,
}

impl Default for VisibilityStyles {
    fn default() -> Self {
        Self {
            hidden: "HiddenContent".to_string(),
            visible: "Normal".to_string(),
        }
    }
}

#[must_use]
/// Lists the mutations an effect produces over `range`, in increasing paragraph order.
///
/// `paragraphs` is the current document; heading detection uses it rather than any earlier
/// outline so nested headings are recognised even after edits.
pub fn plan_mutations(
    range: SectionRange,
    effect: &Effect,
    scope: HeadingScope,
    paragraphs: &[Paragraph],
    styles: &VisibilityStyles,
) -> Vec<Mutation> {
    if range.is_empty() {
        return Vec::new();
    }
    if *effect == Effect::Select {
        return vec![
            Mutation::SelectRange {
                start: range.start,
                end: range.end,
            },
            Mutation::ScrollIntoView { index: range.start },
        ];
    }

    let skip_headings = match scope {
        HeadingScope::Default => matches!(effect, Effect::SetVisibility(_)),
        HeadingScope::IncludeHeadings => false,
        HeadingScope::SkipHeadings => true,
    };

    range
        .indices()
        .filter(|&index| {
            !(skip_headings && paragraphs.get(index).is_some_and(Paragraph::is_heading))
        })
        .filter_map(|index| match effect {
            Effect::SetVisibility(Visibility::Hidden) => Some(Mutation::SetStyle {
                index,
                style: styles.hidden.clone(),
            }),
            Effect::SetVisibility(Visibility::Visible) => Some(Mutation::SetStyle {
                index,
                style: styles.visible.clone(),
            }),
            Effect::Highlight(color) => Some(Mutation::SetHighlight {
                index,
                color: color.clone(),
            }),
            Effect::Font(font) => Some(Mutation::SetFont {
                index,
                font: font.clone(),
            }),
            Effect::Comment(text) => Some(Mutation::InsertComment {
                index,
                text: text.clone(),
            }),
            Effect::Select => None,
        })
        .collect()
}

/// Applies effects to sections of one host document.
pub struct SectionOperations<'h, H: DocumentHost + ?Sized> {
    host: &'h H,
    styles: VisibilityStyles,
}

impl<'h, H: DocumentHost + ?Sized> SectionOperations<'h, H> {
    #[must_use]
    /// Binds operations to `host`, hiding and showing with `styles`.
    pub fn new(host: &'h H, styles: VisibilityStyles) -> Self {
        Self { host, styles }
    }

    /// Reads the document fresh and builds its outline.
    ///
    /// # Errors
    ///
    /// Fails on a host transport error or if the host reports malformed paragraphs.
    pub async fn outline(&self) -> Result<Outline, OperationError> {
        let paragraphs = self.host.paragraphs().await?;
        Ok(build_outline(&paragraphs)?)
    }

    /// Applies `effect` to every paragraph in `range`, best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::StaleReference`] if the range reaches past the current end of the
    /// document, or a host error if the document cannot be read or the batch cannot be flushed.
    pub async fn apply_to_section(
        &self,
        range: SectionRange,
        effect: &Effect,
        scope: HeadingScope,
    ) -> Result<OperationReport, OperationError> {
        if range.is_empty() {
            return Ok(OperationReport::default());
        }
        let paragraphs = self.host.paragraphs().await?;
        if range.end >= paragraphs.len() {
            warn!(
                "range {}..={} exceeds document of {} paragraphs",
                range.start,
                range.end,
                paragraphs.len()
            );
            return Err(OperationError::StaleReference { index: range.end });
        }
        self.execute(range, effect, scope, &paragraphs).await
    }

    /// Resolves the section of the heading identified by `key` against a fresh outline.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::StaleReference`] if no heading with that index and text exists
    /// any more.
    pub async fn resolve(
        &self,
        key: &SectionKey,
        extent: Extent,
    ) -> Result<(Vec<Paragraph>, SectionRange), OperationError> {
        let paragraphs = self.host.paragraphs().await?;
        let outline = build_outline(&paragraphs)?;
        let Some(position) = outline.find(key) else {
            debug!("heading {key:?} not found in fresh outline");
            return Err(OperationError::StaleReference { index: key.index });
        };
        let section = &outline.sections[position];
        let range = match extent {
            Extent::Body => resolve_section_range(section, &outline, paragraphs.len())?,
            Extent::Full => resolve_full_range(section, &outline, paragraphs.len())?,
        };
        Ok((paragraphs, range))
    }

    /// Applies `effect` to the section of the heading identified by `key`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::resolve`], plus host flush failures.
    pub async fn apply_to_heading(
        &self,
        key: &SectionKey,
        extent: Extent,
        effect: &Effect,
        scope: HeadingScope,
    ) -> Result<OperationReport, OperationError> {
        let (paragraphs, range) = self.resolve(key, extent).await?;
        self.execute(range, effect, scope, &paragraphs).await
    }

    /// Hides or shows the body of a heading to match `expansion`.
    ///
    /// Nested headings stay visible so a collapsed section still shows its sub-heading lines.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::apply_to_heading`].
    pub async fn set_expansion(
        &self,
        key: &SectionKey,
        expansion: Expansion,
    ) -> Result<OperationReport, OperationError> {
        let effect = Effect::SetVisibility(expansion.into());
        self.apply_to_heading(key, Extent::Body, &effect, HeadingScope::Default)
            .await
    }

    /// Selects a heading through the end of its section and scrolls it into view.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::apply_to_heading`].
    pub async fn navigate_to_heading(
        &self,
        key: &SectionKey,
    ) -> Result<OperationReport, OperationError> {
        self.apply_to_heading(key, Extent::Full, &Effect::Select, HeadingScope::Default)
            .await
    }

    /// Wraps a heading's body in a content control tagged `section-{index}`.
    ///
    /// Returns `false` when the body is empty and there is nothing to wrap.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::resolve`], plus host flush failures.
    pub async fn wrap_section(&self, key: &SectionKey) -> Result<bool, OperationError> {
        let (_, range) = self.resolve(key, Extent::Body).await?;
        if range.is_empty() {
            return Ok(false);
        }
        let mutation = Mutation::InsertContentControl {
            start: range.start,
            end: range.end,
            tag: ControlTag::Section { index: key.index },
            title: "Section Content".to_string(),
        };
        self.single(mutation).await
    }

    /// Removes the section content control of a heading, keeping its contents.
    ///
    /// Returns `false` when the heading had no such control.
    ///
    /// # Errors
    ///
    /// Returns a host error if the batch cannot be flushed.
    pub async fn unwrap_section(&self, key: &SectionKey) -> Result<bool, OperationError> {
        self.remove_control(ControlTag::Section { index: key.index })
            .await
    }

    /// Removes every content control carrying `tag`, keeping its contents.
    ///
    /// Returns `false` when no control carried the tag.
    ///
    /// # Errors
    ///
    /// Returns a host error if the batch cannot be flushed.
    pub async fn remove_control(&self, tag: ControlTag) -> Result<bool, OperationError> {
        self.single(Mutation::RemoveContentControl { tag }).await
    }

    /// Wraps paragraphs `start..=end` in a content control carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns a host error if the batch cannot be flushed.
    pub async fn wrap_range(
        &self,
        range: SectionRange,
        tag: ControlTag,
        title: &str,
    ) -> Result<bool, OperationError> {
        if range.is_empty() {
            return Ok(false);
        }
        self.single(Mutation::InsertContentControl {
            start: range.start,
            end: range.end,
            tag,
            title: title.to_string(),
        })
        .await
    }

    /// Reads the current text of paragraph `index`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::StaleReference`] if the paragraph no longer exists, or a host
    /// error if the document cannot be read.
    pub async fn paragraph_text(&self, index: usize) -> Result<String, OperationError> {
        let paragraphs = self.host.paragraphs().await?;
        paragraphs
            .get(index)
            .map(|p| p.text.clone())
            .ok_or(OperationError::StaleReference { index })
    }

    /// Replaces the text of paragraph `index`, keeping its style.
    ///
    /// Returns `false` when the host refused the change.
    ///
    /// # Errors
    ///
    /// Returns a host error if the batch cannot be flushed.
    pub async fn replace_text(&self, index: usize, text: &str) -> Result<bool, OperationError> {
        info!("replacing text of paragraph {index}");
        self.single(Mutation::ReplaceText {
            index,
            text: text.to_string(),
        })
        .await
    }

    async fn single(&self, mutation: Mutation) -> Result<bool, OperationError> {
        let ((), outcomes) = run_batch(self.host, |batch| batch.queue(mutation)).await?;
        Ok(outcomes.iter().all(|(_, outcome)| outcome.is_ok()))
    }

    async fn execute(
        &self,
        range: SectionRange,
        effect: &Effect,
        scope: HeadingScope,
        paragraphs: &[Paragraph],
    ) -> Result<OperationReport, OperationError> {
        let mutations = plan_mutations(range, effect, scope, paragraphs, &self.styles);
        if mutations.is_empty() {
            return Ok(OperationReport::default());
        }

        let ((), outcomes) = run_batch(self.host, |batch| {
            for mutation in mutations {
                batch.queue(mutation);
            }
        })
        .await?;

        let report = if *effect == Effect::Select {
            select_report(range, &outcomes)
        } else {
            let mut report = OperationReport::default();
            for (mutation, outcome) in &outcomes {
                match outcome {
                    Ok(()) => report.affected += 1,
                    Err(err) => {
                        warn!("paragraph mutation failed: {err}");
                        if let Some(index) = mutation.target() {
                            report.failed.push(index);
                        }
                    }
                }
            }
            report
        };

        info!(
            "applied {effect:?} to {}..={}: {} affected, {} failed",
            range.start,
            range.end,
            report.affected,
            report.failed.len()
        );
        Ok(report)
    }
}

fn select_report(
    range: SectionRange,
    outcomes: &[(Mutation, MutationOutcome)],
) -> OperationReport {
    let selected = outcomes
        .iter()
        .find(|(m, _)| matches!(m, Mutation::SelectRange { .. }))
        .is_some_and(|(_, outcome)| outcome.is_ok());
    if selected {
        OperationReport {
            affected: range.len(),
            failed: Vec::new(),
        }
    } else {
        OperationReport {
            affected: 0,
            failed: vec![range.start],
        }
    }
}

#[cfg(test)]
#[path = "tests/operations.rs"]
mod tests;
