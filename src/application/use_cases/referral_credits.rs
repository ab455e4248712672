use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::referral_credit::ReferralCredit,
};

// ============================================================================
// Input / Report Types
// ============================================================================

/// A qualifying referral milestone, signalled by the qualification service.
/// `external_id` is its event id and the idempotency key - the milestone may
/// be signalled more than once, the credit is issued once.
#[derive(Debug, Clone)]
pub struct NewCredit {
    pub external_id: String,
    pub referrer_id: Uuid,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCreditExpense {
    pub issued_cents: i64,
    pub redeemed_cents: i64,
}

// ============================================================================
// Redemption policy
// ============================================================================

/// Pick which pending credits a redemption consumes: oldest first, whole
/// credits only. A credit that would overshoot the remaining budget is left
/// pending, so the redeemed total may undershoot the request.
///
/// Whole-credit redemption keeps every credit append-once (the amount never
/// mutates) and the liability invariant trivially auditable.
pub fn select_redeemable(credits: &[(Uuid, i64)], up_to_amount_cents: i64) -> (Vec<Uuid>, i64) {
    let mut selected = Vec::new();
    let mut remaining = up_to_amount_cents;
    for (id, amount) in credits {
        if *amount <= remaining {
            selected.push(*id);
            remaining -= amount;
        }
    }
    (selected, up_to_amount_cents - remaining)
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait ReferralCreditRepo: Send + Sync {
    /// Insert a pending credit; a duplicate `external_id` fails with
    /// `DuplicateEvent`.
    async fn insert(&self, credit: &NewCredit, issued_at: DateTime<Utc>)
    -> AppResult<ReferralCredit>;

    /// Mark the selected pending credits redeemed, FIFO-selected via
    /// `select_redeemable`, all inside one transaction serialized per
    /// referrer. Returns the amount actually redeemed.
    async fn redeem_pending_fifo(
        &self,
        referrer_id: Uuid,
        up_to_amount_cents: i64,
        redeemed_at: DateTime<Utc>,
    ) -> AppResult<i64>;

    /// Platform-wide sum of pending credit amounts.
    async fn sum_outstanding(&self) -> AppResult<i64>;

    /// Credits issued in the given month / redeemed in the given month.
    async fn monthly_expense(&self, year: i32, month: u32) -> AppResult<MonthlyCreditExpense>;

    /// Expire pending credits issued strictly before the cutoff. Returns how
    /// many moved.
    async fn expire_issued_before(
        &self,
        cutoff: DateTime<Utc>,
        expired_at: DateTime<Utc>,
    ) -> AppResult<u64>;

    async fn list_by_referrer(&self, referrer_id: Uuid) -> AppResult<Vec<ReferralCredit>>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ReferralCreditUseCases {
    credits: Arc<dyn ReferralCreditRepo>,
}

impl ReferralCreditUseCases {
    pub fn new(credits: Arc<dyn ReferralCreditRepo>) -> Self {
        Self { credits }
    }

    /// Issue a pending credit for a qualifying milestone. Qualification
    /// itself happens outside this engine; by the time the signal arrives
    /// here it is trusted, only deduplicated.
    pub async fn issue_credit(&self, credit: NewCredit) -> AppResult<ReferralCredit> {
        if credit.amount_cents <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Credit amount must be positive, got {} cents",
                credit.amount_cents
            )));
        }

        let issued = self.credits.insert(&credit, Utc::now()).await?;
        tracing::info!(
            credit_id = %issued.id,
            external_id = %issued.external_id,
            referrer_id = %issued.referrer_id,
            amount_cents = issued.amount_cents,
            "Referral credit issued"
        );
        Ok(issued)
    }

    /// Redeem up to `up_to_amount_cents` of the provider's pending credits
    /// against an invoice. Returns the amount actually redeemed, which may
    /// be less than requested (whole-credit FIFO policy).
    pub async fn redeem_credits(
        &self,
        provider_id: Uuid,
        up_to_amount_cents: i64,
    ) -> AppResult<i64> {
        if up_to_amount_cents < 0 {
            return Err(AppError::InvalidInput(format!(
                "Redemption amount must not be negative, got {} cents",
                up_to_amount_cents
            )));
        }

        let redeemed_cents = self
            .credits
            .redeem_pending_fifo(provider_id, up_to_amount_cents, Utc::now())
            .await?;

        tracing::info!(
            provider_id = %provider_id,
            requested_cents = up_to_amount_cents,
            redeemed_cents,
            "Referral credits redeemed"
        );
        Ok(redeemed_cents)
    }

    /// Platform-wide outstanding liability: the sum of every pending credit
    /// across all referrers. Must always equal issued minus redeemed minus
    /// expired.
    pub async fn get_outstanding_liability(&self) -> AppResult<i64> {
        self.credits.sum_outstanding().await
    }

    /// Issued/redeemed totals for a calendar month, for expense reporting.
    pub async fn get_monthly_expense(
        &self,
        year: i32,
        month: u32,
    ) -> AppResult<MonthlyCreditExpense> {
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidInput(format!(
                "Month must be 1-12, got {}",
                month
            )));
        }
        self.credits.monthly_expense(year, month).await
    }

    /// Expire pending credits issued before the cutoff; run from the
    /// maintenance loop.
    pub async fn expire_credits(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let expired = self
            .credits
            .expire_issued_before(cutoff, Utc::now())
            .await?;
        if expired > 0 {
            tracing::info!(count = expired, "Expired stale referral credits");
        }
        Ok(expired)
    }

    pub async fn list_credits(&self, referrer_id: Uuid) -> AppResult<Vec<ReferralCredit>> {
        self.credits.list_by_referrer(referrer_id).await
    }
}
