use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Pending,
    Redeemed,
    Expired,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Pending => "pending",
            CreditStatus::Redeemed => "redeemed",
            CreditStatus::Expired => "expired",
        }
    }

    /// Pending credits make up the platform's outstanding liability.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, CreditStatus::Pending)
    }
}

impl std::fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A platform-issued liability owed to a referrer, redeemable against future
/// invoices. Transitions exactly once from pending to redeemed or expired;
/// the amount never changes (whole-credit redemption only).
///
/// `external_id` is the milestone event id from the referral qualification
/// service and the idempotency key for issuance.
#[derive(Debug, Clone, Serialize)]
pub struct ReferralCredit {
    pub id: Uuid,
    pub external_id: String,
    pub referrer_id: Uuid,
    pub amount_cents: i64,
    pub status: CreditStatus,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub redeemed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub expired_at: Option<chrono::DateTime<chrono::Utc>>,
}
