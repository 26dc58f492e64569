//! The edit plan records document mutations so a session can be saved and replayed.
//!
//! Every mutation the in-memory host applies is appended here. The plan serialises to JSON, so a
//! session's edits can be written out on exit and replayed onto a freshly loaded document later.

use crate::document::{run_batch, DocumentHost, Mutation};
use crate::error::HostError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{fs, io};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
/// Serialisable log of applied mutations, in application order.
pub struct EditPlan {
    /// Individual mutations with the text they targeted.
    pub edits: Vec<Edit>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
/// One applied mutation.
pub struct Edit {
    /// The host write that was performed.
    pub mutation: Mutation,
    /// Text of the targeted paragraph at the time, for tracking and debugging.
    #[serde(default)]
    pub target_text: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Result of replaying a plan onto a host.
pub struct ReplayReport {
    /// Mutations the host accepted.
    pub applied: usize,
    /// Mutations the host rejected.
    pub failed: usize,
}

impl EditPlan {
    /// Appends an applied mutation.
    pub fn record(&mut self, mutation: Mutation, target_text: impl Into<String>) {
        self.edits.push(Edit {
            mutation,
            target_text: target_text.into(),
        });
    }

    #[must_use]
    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    #[must_use]
    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Reads a plan from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid plan.
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Writes the plan as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    /// Replays every edit onto `host` in a single batch.
    ///
    /// Edits the host rejects are counted and logged; the rest still apply.
    ///
    /// # Errors
    ///
    /// Returns the host's transport error if the batch could not be executed.
    pub async fn replay<H: DocumentHost + ?Sized>(
        &self,
        host: &H,
    ) -> Result<ReplayReport, HostError> {
        let ((), outcomes) = run_batch(host, |batch| {
            for edit in &self.edits {
                batch.queue(edit.mutation.clone());
            }
        })
        .await?;

        let mut report = ReplayReport::default();
        for (mutation, outcome) in outcomes {
            match outcome {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    warn!("replay skipped {mutation:?}: {err}");
                    report.failed += 1;
                }
            }
        }
        info!(
            "replayed edit plan: {} applied, {} failed",
            report.applied, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "tests/edit_plan.rs"]
mod tests;
