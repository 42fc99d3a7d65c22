//! Charge request and outcome types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to charge an account for one processed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Account the charge is billed to.
    pub account_id: Uuid,
    /// Charge amount in cents.
    pub amount_cents: i64,
    /// Human-readable line item description.
    pub description: String,
    /// Job this charge settles. Doubles as the idempotency key.
    pub job_id: Uuid,
}

impl ChargeRequest {
    /// Creates a new charge request.
    pub fn new(
        account_id: Uuid,
        amount_cents: i64,
        description: impl Into<String>,
        job_id: Uuid,
    ) -> Self {
        Self {
            account_id,
            amount_cents,
            description: description.into(),
            job_id,
        }
    }

    /// Returns the idempotency key the ledger deduplicates on.
    #[inline]
    pub fn idempotency_key(&self) -> String {
        self.job_id.to_string()
    }
}

/// Receipt returned by the ledger for an accepted charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    /// Ledger entry identifier.
    pub receipt_id: Uuid,
    /// When the ledger recorded the charge.
    pub charged_at: Timestamp,
}

/// Outcome of a charge attempt.
///
/// `InsufficientFunds` is a business outcome, not an error: the job stays
/// completed and the caller decides how to follow up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChargeOutcome {
    /// The ledger accepted the charge (or had already accepted it for
    /// this job ID).
    Charged(ChargeReceipt),
    /// The account balance does not cover the charge.
    InsufficientFunds,
}

impl ChargeOutcome {
    /// Returns `true` if the charge was accepted.
    #[inline]
    pub fn is_charged(&self) -> bool {
        matches!(self, Self::Charged(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_key_is_the_job_id() {
        let job_id = Uuid::now_v7();
        let request = ChargeRequest::new(Uuid::now_v7(), 250, "OCR extraction", job_id);
        assert_eq!(request.idempotency_key(), job_id.to_string());
    }

    #[test]
    fn outcome_round_trips_through_json() {
        let outcome = ChargeOutcome::Charged(ChargeReceipt {
            receipt_id: Uuid::now_v7(),
            charged_at: Timestamp::now(),
        });

        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: ChargeOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
        assert!(parsed.is_charged());

        let broke: ChargeOutcome =
            serde_json::from_str("\"InsufficientFunds\"").unwrap();
        assert!(!broke.is_charged());
    }
}
