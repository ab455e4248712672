use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PayoutType {
    Standard,
    Instant,
}

impl PayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutType::Standard => "standard",
            PayoutType::Instant => "instant",
        }
    }
}

impl std::fmt::Display for PayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Requested,
    InTransit,
    Paid,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Requested => "requested",
            PayoutStatus::InTransit => "in_transit",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Failed => "failed",
        }
    }

    /// Check if this status is terminal. A failed payout never auto-retries;
    /// it surfaces to the provider for manual re-request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Paid | PayoutStatus::Failed)
    }

    /// Valid transitions: requested -> in_transit -> paid, or
    /// requested -> failed. Everything else (including replays of the same
    /// status) is invalid and skipped by the ledger.
    pub fn can_transition_to(&self, next: PayoutStatus) -> bool {
        matches!(
            (self, next),
            (PayoutStatus::Requested, PayoutStatus::InTransit)
                | (PayoutStatus::Requested, PayoutStatus::Failed)
                | (PayoutStatus::InTransit, PayoutStatus::Paid)
        )
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(PayoutStatus::Requested),
            "in_transit" => Ok(PayoutStatus::InTransit),
            "paid" => Ok(PayoutStatus::Paid),
            "failed" => Ok(PayoutStatus::Failed),
            _ => Err(format!("Invalid payout status: {}", s)),
        }
    }
}

/// A request to move a provider's available balance out to their bank.
///
/// The engine never decrements the balance when the request is created -
/// only on the confirmed `requested -> in_transit` transition reported by
/// the processor.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutRequest {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub payout_type: PayoutType,
    pub amount_cents: i64,
    /// 0 for standard payouts, 1.5% of the amount for instant.
    pub fee_cents: i64,
    pub status: PayoutStatus,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub expected_arrival: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::NaiveDateTime>,
}

impl PayoutRequest {
    /// What the provider actually receives once the transfer lands.
    pub fn net_receipt_cents(&self) -> i64 {
        self.amount_cents - self.fee_cents
    }
}
