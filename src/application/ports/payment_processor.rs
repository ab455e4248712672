use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::payout::PayoutType,
};

/// Unique identifier for a transfer in the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(pub String);

impl TransferId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Acknowledgement that the processor accepted a transfer request. Status
/// progress past acceptance arrives asynchronously via webhooks.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferAck {
    pub transfer_id: TransferId,
    pub accepted: bool,
}

/// Provider balance and payout flags as the processor reports them. The
/// reconciliation loop periodically folds this back into the engine's view.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorBalance {
    pub available_cents: i64,
    pub pending_cents: i64,
    /// True when the provider has a debit card on file.
    pub instant_payout_eligible: bool,
}

/// Payment processor port.
///
/// The engine only ever *requests* transfers and *reads* balance state; it
/// never implements card or bank movement itself. Timeouts and connection
/// failures surface as `ProcessorUnavailable` (retryable), never as silent
/// success.
#[async_trait]
pub trait PaymentProcessorPort: Send + Sync {
    /// Ask the processor to execute a payout transfer. The payout id is
    /// passed through so status webhooks can be correlated back.
    async fn request_transfer(
        &self,
        payout_id: Uuid,
        provider_id: Uuid,
        amount_cents: i64,
        payout_type: PayoutType,
    ) -> AppResult<TransferAck>;

    /// Read the provider's current balance and eligibility flags.
    async fn fetch_balance(&self, provider_id: Uuid) -> AppResult<ProcessorBalance>;
}
