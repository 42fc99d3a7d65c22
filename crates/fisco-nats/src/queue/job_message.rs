//! Queue message envelope for OCR jobs.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message published to the OCR work queue.
///
/// Deliberately thin: only the job ID and the publish time. Everything else
/// lives on the job row, so a redelivered message can never carry stale
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    /// Job identifier, matches the `document_jobs` row.
    pub job_id: Uuid,
    /// When the message was published.
    pub enqueued_at: Timestamp,
}

impl JobMessage {
    /// Creates a new message for the given job.
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            enqueued_at: Timestamp::now(),
        }
    }

    /// Returns how long ago the message was enqueued.
    pub fn age(&self) -> std::time::Duration {
        let now = Timestamp::now();
        let signed_dur = now.duration_since(self.enqueued_at);
        std::time::Duration::from_secs(signed_dur.as_secs().max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let message = JobMessage::new(Uuid::now_v7());

        let json = serde_json::to_string(&message).unwrap();
        let parsed: JobMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, message);
        assert!(json.contains("job_id"));
        assert!(json.contains("enqueued_at"));
    }

    #[test]
    fn fresh_messages_have_zero_age() {
        let message = JobMessage::new(Uuid::now_v7());
        assert_eq!(message.age().as_secs(), 0);
    }
}
