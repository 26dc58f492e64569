//! Error types for outline building, section resolution and host operations.
//!
//! Malformed input and stale references are kept apart from host failures so that callers can
//! drop an out-of-date entry and rebuild the outline instead of retrying a host call.

use crate::transform::TransformError;

/// Rejection of a paragraph sequence the outline cannot be built from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutlineError {
    /// Paragraph index at or beyond the number of paragraphs supplied.
    #[error("paragraph index {index} is out of range for {count} paragraphs")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of paragraphs in the sequence.
        count: usize,
    },

    /// The same paragraph index appears twice.
    #[error("paragraph index {index} appears more than once")]
    DuplicateIndex {
        /// Repeated index.
        index: usize,
    },

    /// Indices do not follow document order.
    #[error("paragraph index {index} follows {previous}, expected {expected}")]
    OutOfOrder {
        /// Index that broke the sequence.
        index: usize,
        /// Index immediately before it.
        previous: usize,
        /// Index that should have appeared.
        expected: usize,
    },

    /// Heading level deeper than a host style can express.
    #[error("paragraph {index} has heading level {level}, expected 0..=6")]
    InvalidLevel {
        /// Paragraph carrying the level.
        index: usize,
        /// Level reported.
        level: u8,
    },
}

/// Failure to resolve the paragraph range of a section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The heading no longer exists in the outline or document it was resolved against.
    #[error("section at paragraph {index} is no longer in the document")]
    StaleReference {
        /// Paragraph index the caller held.
        index: usize,
    },
}

/// Host transport failure: the whole batch could not be read or executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The host could not be reached or refused the batch.
    #[error("host unavailable: {0}")]
    Unavailable(String),

    /// The host accepted the batch but failed while running it.
    #[error("host batch failed: {0}")]
    BatchFailed(String),
}

/// Failure of a single queued mutation inside an otherwise successful batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Target paragraph does not exist.
    #[error("paragraph {0} not found")]
    NotFound(usize),

    /// The host refused to change the paragraph.
    #[error("paragraph {index} rejected the change: {reason}")]
    Rejected {
        /// Target paragraph.
        index: usize,
        /// Host explanation.
        reason: String,
    },
}

/// Failure of a whole section operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// The heading or range refers to paragraphs that have since changed.
    #[error("stale reference to paragraph {index}; rebuild the outline")]
    StaleReference {
        /// Paragraph index the caller held.
        index: usize,
    },

    /// The host refused the one paragraph the operation needed.
    #[error("host rejected the change to paragraph {index}")]
    Rejected {
        /// Target paragraph.
        index: usize,
    },

    /// Reading or writing the host failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The freshly read document could not be outlined.
    #[error(transparent)]
    Outline(#[from] OutlineError),

    /// A text transform of the paragraph failed before anything was written.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl From<ResolveError> for OperationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::StaleReference { index } => Self::StaleReference { index },
        }
    }
}

impl OperationError {
    #[must_use]
    /// Whether the caller should rebuild the outline rather than retry.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }
}
