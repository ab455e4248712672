use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::plan_tier::PlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Returns true if the provider currently counts toward subscription MRR
    /// and tier distribution.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    /// Returns true if the provider is in a grace period (past due but not
    /// yet canceled).
    pub fn is_grace_period(&self) -> bool {
        matches!(self, SubscriptionStatus::PastDue)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

/// One row per provider organization. Owned exclusively by the engine:
/// mutated only through event ingestion and the reconciliation balance sync,
/// never handed out as a live reference.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderAccount {
    pub id: Uuid,
    pub current_tier: PlanTier,
    pub subscription_status: SubscriptionStatus,
    pub payout_delay_days: i32,
    /// Reported by the processor (debit card on file); never computed here.
    pub instant_payout_eligible: bool,
    pub available_balance_cents: i64,
    pub pending_balance_cents: i64,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub updated_at: Option<chrono::NaiveDateTime>,
}
