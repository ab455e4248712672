use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settlement state reported by the processor for a completed payment.
/// Decides which balance bucket the net amount lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "settlement_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SettlementState {
    Settled,
    Pending,
}

impl SettlementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementState::Settled => "settled",
            SettlementState::Pending => "pending",
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementState::Settled)
    }
}

impl std::fmt::Display for SettlementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable record of one completed client payment.
///
/// `id` is the processor's event id and the idempotency key: a given id is
/// recorded at most once, duplicates are rejected rather than overwritten.
/// `fee_amount_cents` and `fee_bps` are computed at ingestion time from the
/// provider's tier and never change afterwards - a later tier change must not
/// retroactively alter historical fee records.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentEvent {
    pub id: String,
    pub provider_id: Uuid,
    pub gross_amount_cents: i64,
    pub fee_amount_cents: i64,
    pub fee_bps: i64,
    pub settlement: SettlementState,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub recorded_at: Option<chrono::NaiveDateTime>,
}

impl PaymentEvent {
    /// Amount owed to the provider after the platform fee.
    pub fn net_amount_cents(&self) -> i64 {
        self.gross_amount_cents - self.fee_amount_cents
    }
}
