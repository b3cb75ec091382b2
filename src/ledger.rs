use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// in-memory record of settled payments, keyed by provider charge id
///
/// Shared between the update dispatcher and the http endpoint. Nothing is
/// persisted; the ledger starts empty on every launch.
#[derive(Clone, Default)]
pub struct PaymentLedger {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// stores `payload` under `charge_id`, returning the payload it replaced
    pub async fn record(&self, charge_id: &str, payload: &str) -> Option<String> {
        let mut records = self.records.lock().await;
        records.insert(charge_id.to_string(), payload.to_string())
    }

    pub async fn lookup(&self, charge_id: &str) -> Option<String> {
        let records = self.records.lock().await;
        records.get(charge_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
