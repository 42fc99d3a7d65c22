//! In-memory ledger for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    BillingProvider, ChargeOutcome, ChargeReceipt, ChargeRequest, Result, ServiceHealth,
};

#[derive(Debug, Default)]
struct LedgerState {
    /// Settled charges keyed by job ID, mirroring the real ledger's
    /// idempotency-key deduplication.
    charges: HashMap<Uuid, ChargeReceipt>,
    /// Remaining balance; `None` means unlimited.
    balance_cents: Option<i64>,
}

/// In-memory billing ledger.
///
/// Deduplicates on job ID like the real ledger, so tests can assert that
/// redelivered jobs produce exactly one charge.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    /// Creates a ledger with unlimited funds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger holding a fixed balance.
    pub fn with_balance(balance_cents: i64) -> Self {
        let ledger = Self::new();
        ledger
            .state
            .lock()
            .expect("ledger lock poisoned")
            .balance_cents = Some(balance_cents);
        ledger
    }

    /// Returns the number of settled charges.
    pub fn charge_count(&self) -> usize {
        self.state.lock().expect("ledger lock poisoned").charges.len()
    }

    /// Returns the receipt for a job, if it was charged.
    pub fn receipt_for(&self, job_id: Uuid) -> Option<ChargeReceipt> {
        self.state
            .lock()
            .expect("ledger lock poisoned")
            .charges
            .get(&job_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl BillingProvider for MemoryLedger {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        let mut state = self.state.lock().expect("ledger lock poisoned");

        // Replay: the key has already settled
        if let Some(receipt) = state.charges.get(&request.job_id) {
            return Ok(ChargeOutcome::Charged(receipt.clone()));
        }

        if let Some(balance) = state.balance_cents {
            if balance < request.amount_cents {
                return Ok(ChargeOutcome::InsufficientFunds);
            }
            state.balance_cents = Some(balance - request.amount_cents);
        }

        let receipt = ChargeReceipt {
            receipt_id: Uuid::now_v7(),
            charged_at: Timestamp::now(),
        };
        state.charges.insert(request.job_id, receipt.clone());
        Ok(ChargeOutcome::Charged(receipt))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount_cents: i64) -> ChargeRequest {
        ChargeRequest::new(Uuid::now_v7(), amount_cents, "OCR extraction", Uuid::now_v7())
    }

    #[tokio::test]
    async fn repeated_charges_for_one_job_settle_once() {
        let ledger = MemoryLedger::new();
        let req = request(250);

        let first = ledger.charge(&req).await.unwrap();
        let second = ledger.charge(&req).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.charge_count(), 1);
    }

    #[tokio::test]
    async fn balance_is_enforced() {
        let ledger = MemoryLedger::with_balance(300);

        assert!(ledger.charge(&request(250)).await.unwrap().is_charged());
        assert!(!ledger.charge(&request(250)).await.unwrap().is_charged());
        assert_eq!(ledger.charge_count(), 1);
    }

    #[tokio::test]
    async fn declined_charges_are_not_recorded() {
        let ledger = MemoryLedger::with_balance(0);
        let req = request(100);

        assert!(!ledger.charge(&req).await.unwrap().is_charged());
        assert!(ledger.receipt_for(req.job_id).is_none());
    }
}
