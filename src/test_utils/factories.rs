//! Factories for test entities with sensible defaults.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{
    payment_event::SettlementState,
    plan_tier::PlanTier,
    provider_account::{ProviderAccount, SubscriptionStatus},
};
use crate::use_cases::revenue_ledger::NewPayment;

/// An active provider on the given tier with empty balances.
pub fn provider(tier: PlanTier) -> ProviderAccount {
    ProviderAccount {
        id: Uuid::new_v4(),
        current_tier: tier,
        subscription_status: SubscriptionStatus::Active,
        payout_delay_days: 2,
        instant_payout_eligible: false,
        available_balance_cents: 0,
        pending_balance_cents: 0,
        created_at: Some(Utc::now().naive_utc()),
        updated_at: Some(Utc::now().naive_utc()),
    }
}

pub fn provider_with_balance(tier: PlanTier, available_balance_cents: i64) -> ProviderAccount {
    ProviderAccount {
        available_balance_cents,
        ..provider(tier)
    }
}

/// A settled payment that occurred just now.
pub fn payment(id: &str, provider_id: Uuid, gross_amount_cents: i64) -> NewPayment {
    NewPayment {
        id: id.to_string(),
        provider_id,
        gross_amount_cents,
        settlement: SettlementState::Settled,
        occurred_at: Utc::now(),
    }
}
