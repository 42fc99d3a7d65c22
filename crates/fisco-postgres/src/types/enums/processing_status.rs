//! Processing status enumeration for document job lifecycle tracking.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the current state of a document job in the processing pipeline.
///
/// This enumeration corresponds to the `PROCESSING_STATUS` PostgreSQL enum.
/// Jobs move `pending -> processing -> completed | failed`; the two terminal
/// states are never left once entered. A job may be re-claimed while already
/// in `processing` (a worker that crashed mid-run leaves it there, and the
/// queue redelivers the message), which is why claims accept both
/// non-terminal states.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::ProcessingStatus"]
pub enum ProcessingStatus {
    /// Job is recorded and waiting to be picked up by a worker
    #[db_rename = "pending"]
    #[serde(rename = "pending")]
    #[default]
    Pending,

    /// Job is currently being processed by a worker
    #[db_rename = "processing"]
    #[serde(rename = "processing")]
    Processing,

    /// Extraction succeeded, results are stored on the job
    #[db_rename = "completed"]
    #[serde(rename = "completed")]
    Completed,

    /// Extraction failed permanently, error message is stored on the job
    #[db_rename = "failed"]
    #[serde(rename = "failed")]
    Failed,
}

impl ProcessingStatus {
    /// Returns whether the job is waiting to start.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(self, ProcessingStatus::Pending)
    }

    /// Returns whether the job is currently being processed.
    #[inline]
    pub fn is_processing(self) -> bool {
        matches!(self, ProcessingStatus::Processing)
    }

    /// Returns whether the job completed successfully.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, ProcessingStatus::Completed)
    }

    /// Returns whether the job failed permanently.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, ProcessingStatus::Failed)
    }

    /// Returns whether the job reached a final state.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    /// Returns whether a worker may claim the job.
    ///
    /// Claims from `processing` are allowed so that a message redelivered
    /// after a worker crash can be picked up again.
    #[inline]
    pub fn can_be_claimed(self) -> bool {
        matches!(
            self,
            ProcessingStatus::Pending | ProcessingStatus::Processing
        )
    }

    /// Returns whether a transition from this status to `next` is valid.
    pub fn can_transition_to(self, next: ProcessingStatus) -> bool {
        match self {
            ProcessingStatus::Pending => matches!(next, ProcessingStatus::Processing),
            ProcessingStatus::Processing => matches!(
                next,
                // Re-claim after a crash restamps `processing`.
                ProcessingStatus::Processing
                    | ProcessingStatus::Completed
                    | ProcessingStatus::Failed
            ),
            ProcessingStatus::Completed | ProcessingStatus::Failed => false,
        }
    }

    /// Returns the statuses from which a worker may claim a job.
    pub fn claimable_statuses() -> &'static [ProcessingStatus] {
        &[ProcessingStatus::Pending, ProcessingStatus::Processing]
    }

    /// Returns the statuses that represent final states.
    pub fn terminal_statuses() -> &'static [ProcessingStatus] {
        &[ProcessingStatus::Completed, ProcessingStatus::Failed]
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn terminal_states_admit_no_transitions() {
        for terminal in ProcessingStatus::terminal_statuses() {
            for next in ProcessingStatus::iter() {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn claims_accept_both_non_terminal_states() {
        assert!(ProcessingStatus::Pending.can_be_claimed());
        assert!(ProcessingStatus::Processing.can_be_claimed());
        assert!(!ProcessingStatus::Completed.can_be_claimed());
        assert!(!ProcessingStatus::Failed.can_be_claimed());
    }

    #[test]
    fn pending_only_moves_to_processing() {
        assert!(ProcessingStatus::Pending.can_transition_to(ProcessingStatus::Processing));
        assert!(!ProcessingStatus::Pending.can_transition_to(ProcessingStatus::Completed));
        assert!(!ProcessingStatus::Pending.can_transition_to(ProcessingStatus::Failed));
        assert!(!ProcessingStatus::Pending.can_transition_to(ProcessingStatus::Pending));
    }

    #[test]
    fn processing_settles_or_restamps() {
        assert!(ProcessingStatus::Processing.can_transition_to(ProcessingStatus::Processing));
        assert!(ProcessingStatus::Processing.can_transition_to(ProcessingStatus::Completed));
        assert!(ProcessingStatus::Processing.can_transition_to(ProcessingStatus::Failed));
        assert!(!ProcessingStatus::Processing.can_transition_to(ProcessingStatus::Pending));
    }

    #[test]
    fn wire_format_is_lowercase() {
        let json = serde_json::to_string(&ProcessingStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
