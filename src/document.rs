//! Asynchronous interface to the host document.
//!
//! Hosts work in batches: reads and writes are queued against a context and only take effect
//! when the batch is synchronised. [`Batch`] queues [`Mutation`]s and [`run_batch`] scopes one,
//! flushing it on every exit path of the caller's closure, including when the closure fails.

use crate::error::{HostError, MutationError};
use crate::paragraph::Paragraph;
use crate::tag::ControlTag;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Character formatting to apply; `None` fields are left unchanged.
pub struct FontFormat {
    /// Bold weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic slant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Single underline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Font colour as a name or `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Point size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u16>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl FontFormat {
    #[must_use]
    /// Overlays the fields set in `other` onto `self`.
    pub fn merged(&self, other: &FontFormat) -> FontFormat {
        FontFormat {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            color: other.color.clone().or_else(|| self.color.clone()),
            size: other.size.or(self.size),
            family: other.family.clone().or_else(|| self.family.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// A single write request queued against the host.
pub enum Mutation {
    /// Replace the paragraph style.
    SetStyle {
        /// Target paragraph.
        index: usize,
        /// Style name.
        style: String,
    },
    /// Set or clear the highlight colour.
    SetHighlight {
        /// Target paragraph.
        index: usize,
        /// Colour name, or `None` to clear.
        color: Option<String>,
    },
    /// Apply character formatting.
    SetFont {
        /// Target paragraph.
        index: usize,
        /// Formatting to overlay.
        font: FontFormat,
    },
    /// Attach a comment to the paragraph.
    InsertComment {
        /// Target paragraph.
        index: usize,
        /// Comment body.
        text: String,
    },
    /// Select paragraphs `start..=end` in the host.
    SelectRange {
        /// First paragraph.
        start: usize,
        /// Last paragraph.
        end: usize,
    },
    /// Scroll the paragraph into view.
    ScrollIntoView {
        /// Target paragraph.
        index: usize,
    },
    /// Wrap paragraphs `start..=end` in a tagged content control.
    InsertContentControl {
        /// First paragraph.
        start: usize,
        /// Last paragraph.
        end: usize,
        /// Classification tag.
        tag: ControlTag,
        /// Display title.
        title: String,
    },
    /// Remove every content control carrying `tag`, keeping its contents.
    RemoveContentControl {
        /// Tag to match.
        tag: ControlTag,
    },
    /// Replace the paragraph's text, keeping its style and formatting.
    ReplaceText {
        /// Target paragraph.
        index: usize,
        /// New text.
        text: String,
    },
}

impl Mutation {
    #[must_use]
    /// First paragraph the mutation targets, if it targets one.
    pub fn target(&self) -> Option<usize> {
        match self {
            Self::SetStyle { index, .. }
            | Self::SetHighlight { index, .. }
            | Self::SetFont { index, .. }
            | Self::InsertComment { index, .. }
            | Self::ReplaceText { index, .. }
            | Self::ScrollIntoView { index } => Some(*index),
            Self::SelectRange { start, .. } | Self::InsertContentControl { start, .. } => {
                Some(*start)
            }
            Self::RemoveContentControl { .. } => None,
        }
    }
}

/// Outcome of one queued mutation.
pub type MutationOutcome = Result<(), MutationError>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Tagged content control currently present in the document.
pub struct ContentControl {
    /// Classification tag.
    pub tag: ControlTag,
    /// Display title.
    pub title: String,
    /// First wrapped paragraph.
    pub start: usize,
    /// Last wrapped paragraph.
    pub end: usize,
}

/// Host document accessor.
///
/// Implementations execute each mutation of a batch independently and in order: one failed
/// mutation is reported in its outcome slot and does not stop the rest. A transport failure
/// fails the whole call instead.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Loads every paragraph with its text and heading level.
    async fn paragraphs(&self) -> Result<Vec<Paragraph>, HostError>;

    /// Loads the tagged content controls in the document.
    async fn content_controls(&self) -> Result<Vec<ContentControl>, HostError>;

    /// Executes queued mutations, returning one outcome per mutation in the same order.
    async fn execute(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, HostError>;
}

/// Mutations queued against a host, applied together on [`Batch::sync`].
pub struct Batch<'h, H: DocumentHost + ?Sized> {
    host: &'h H,
    queued: Vec<Mutation>,
}

impl<'h, H: DocumentHost + ?Sized> Batch<'h, H> {
    #[must_use]
    /// Opens an empty batch on `host`.
    pub fn new(host: &'h H) -> Self {
        Self {
            host,
            queued: Vec::new(),
        }
    }

    /// Queues a mutation.
    pub fn queue(&mut self, mutation: Mutation) {
        self.queued.push(mutation);
    }

    #[must_use]
    /// Number of mutations waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.queued.len()
    }

    /// Flushes the queue, pairing each mutation with its outcome.
    ///
    /// # Errors
    ///
    /// Returns the host's transport error if the batch could not be executed, or
    /// [`HostError::BatchFailed`] if the host returned the wrong number of outcomes.
    pub async fn sync(self) -> Result<Vec<(Mutation, MutationOutcome)>, HostError> {
        if self.queued.is_empty() {
            return Ok(Vec::new());
        }
        let count = self.queued.len();
        debug!("flushing batch of {count} mutations");

        let outcomes = self.host.execute(self.queued.clone()).await?;
        if outcomes.len() != count {
            warn!(
                "host returned {} outcomes for {count} mutations",
                outcomes.len()
            );
            return Err(HostError::BatchFailed(format!(
                "expected {count} outcomes, got {}",
                outcomes.len()
            )));
        }
        Ok(self.queued.into_iter().zip(outcomes).collect())
    }
}

/// Runs `fill` against a fresh batch and always flushes whatever it queued.
///
/// The closure's own result is returned alongside the flushed outcomes. Mutations queued before
/// the closure returned an error are still sent to the host, mirroring a host context that
/// synchronises on every exit path.
///
/// # Errors
///
/// Returns a transport error from the flush; the closure's result is lost in that case.
pub async fn run_batch<H, T, F>(
    host: &H,
    fill: F,
) -> Result<(T, Vec<(Mutation, MutationOutcome)>), HostError>
where
    H: DocumentHost + ?Sized,
    F: FnOnce(&mut Batch<'_, H>) -> T,
{
    let mut batch = Batch::new(host);
    let value = fill(&mut batch);
    let outcomes = batch.sync().await?;
    Ok((value, outcomes))
}

#[cfg(test)]
#[path = "tests/document.rs"]
mod tests;
