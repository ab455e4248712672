use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::fees,
    domain::entities::{
        payment_event::{PaymentEvent, SettlementState},
        plan_tier::PlanTier,
        provider_account::{ProviderAccount, SubscriptionStatus},
    },
};

/// Transaction-fee MRR looks at payments in the trailing 30 days ending at
/// `as_of`. A rolling window, deliberately not a calendar month: calendar
/// boundaries would create reporting discontinuities.
const TRAILING_WINDOW_DAYS: i64 = 30;

const MONTHS_PER_YEAR: i64 = 12;

// ============================================================================
// Input Types
// ============================================================================

/// A completed client payment as delivered by the processor. The fee is
/// conspicuously absent: the engine computes it, it never trusts external
/// rounding.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: String,
    pub provider_id: Uuid,
    pub gross_amount_cents: i64,
    pub settlement: SettlementState,
    pub occurred_at: DateTime<Utc>,
}

/// Fully-computed payment record handed to the persistence layer.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: String,
    pub provider_id: Uuid,
    pub gross_amount_cents: i64,
    pub fee_amount_cents: i64,
    pub fee_bps: i64,
    pub settlement: SettlementState,
    pub occurred_at: DateTime<Utc>,
}

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MrrReport {
    pub subscription_mrr_cents: i64,
    pub transaction_fee_mrr_cents: i64,
    pub total_mrr_cents: i64,
    pub arr_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierCount {
    pub tier: PlanTier,
    pub provider_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueSummary {
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub payment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedPayments {
    pub payments: Vec<PaymentEvent>,
    pub total: i64,
    pub page: i32,
    pub per_page: i32,
    pub total_pages: i32,
}

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait ProviderAccountRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ProviderAccount>>;

    /// Idempotent upsert of current subscription state. Activation sets the
    /// tier; cancellation keeps the last tier for reporting.
    async fn upsert_subscription(
        &self,
        provider_id: Uuid,
        tier: Option<PlanTier>,
        status: SubscriptionStatus,
    ) -> AppResult<()>;

    /// Provider counts per tier, `active` subscriptions only.
    async fn count_active_by_tier(&self) -> AppResult<Vec<(PlanTier, i64)>>;

    /// All provider ids, for the reconciliation sweep.
    async fn list_ids(&self) -> AppResult<Vec<Uuid>>;

    /// Fold a processor-reported balance snapshot back into the account
    /// (reconciliation sync).
    async fn apply_balance_snapshot(
        &self,
        provider_id: Uuid,
        available_cents: i64,
        pending_cents: i64,
        instant_payout_eligible: bool,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait PaymentEventRepo: Send + Sync {
    /// Persist a payment and apply its net amount to the provider's balance
    /// in one transaction. A duplicate event id fails with `DuplicateEvent`;
    /// a partial write (fee recorded without the event, or vice versa) must
    /// be impossible.
    async fn record(&self, record: &PaymentRecord) -> AppResult<PaymentEvent>;

    /// Sum of fee amounts over payments with `occurred_at` in `(from, to]`.
    async fn sum_fees_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<i64>;

    /// Gross/fee totals and count over an optional date range.
    async fn summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<RevenueSummary>;

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayments>;
}

/// Append-only audit of processed processor events; backs webhook-level
/// duplicate detection across all event kinds.
#[async_trait]
pub trait LedgerEventRepo: Send + Sync {
    async fn record(
        &self,
        event_id: &str,
        event_type: &str,
        provider_id: Option<Uuid>,
        payload: &serde_json::Value,
    ) -> AppResult<()>;

    async fn exists(&self, event_id: &str) -> AppResult<bool>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct RevenueLedgerUseCases {
    accounts: Arc<dyn ProviderAccountRepo>,
    payments: Arc<dyn PaymentEventRepo>,
    events: Arc<dyn LedgerEventRepo>,
}

impl RevenueLedgerUseCases {
    pub fn new(
        accounts: Arc<dyn ProviderAccountRepo>,
        payments: Arc<dyn PaymentEventRepo>,
        events: Arc<dyn LedgerEventRepo>,
    ) -> Self {
        Self {
            accounts,
            payments,
            events,
        }
    }

    /// Record one completed client payment.
    ///
    /// The fee is computed from the provider's *current* tier and snapshotted
    /// onto the record; later tier changes never touch it. Duplicate event
    /// ids fail with `DuplicateEvent` - upstream delivery is at-least-once,
    /// and a replay must change ledger state exactly zero times.
    pub async fn record_payment(&self, payment: NewPayment) -> AppResult<PaymentEvent> {
        let account = self
            .accounts
            .get_by_id(payment.provider_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let tier = account.current_tier;
        let fee_amount_cents = fees::transaction_fee_cents(tier, payment.gross_amount_cents)?;

        let record = PaymentRecord {
            id: payment.id,
            provider_id: payment.provider_id,
            gross_amount_cents: payment.gross_amount_cents,
            fee_amount_cents,
            fee_bps: tier.transaction_fee_bps(),
            settlement: payment.settlement,
            occurred_at: payment.occurred_at,
        };

        let event = self.payments.record(&record).await?;

        tracing::info!(
            event_id = %event.id,
            provider_id = %event.provider_id,
            gross_cents = event.gross_amount_cents,
            fee_cents = event.fee_amount_cents,
            tier = %tier,
            "Payment recorded"
        );

        Ok(event)
    }

    /// Idempotent upsert: the provider's subscription is active on `tier`.
    pub async fn record_subscription_active(
        &self,
        provider_id: Uuid,
        tier: PlanTier,
    ) -> AppResult<()> {
        self.accounts
            .upsert_subscription(provider_id, Some(tier), SubscriptionStatus::Active)
            .await
    }

    /// Idempotent upsert: the provider's subscription is canceled. The last
    /// tier is kept on the account for reporting.
    pub async fn record_subscription_canceled(&self, provider_id: Uuid) -> AppResult<()> {
        self.accounts
            .upsert_subscription(provider_id, None, SubscriptionStatus::Canceled)
            .await
    }

    /// Monthly and annual recurring revenue as of a point in time.
    ///
    /// Subscription MRR comes from current active-subscription state;
    /// transaction-fee MRR from the trailing 30-day payment window ending at
    /// `as_of`. Every surface that shows MRR reads this one computation.
    pub async fn get_mrr(&self, as_of: DateTime<Utc>) -> AppResult<MrrReport> {
        let counts = self.accounts.count_active_by_tier().await?;
        let subscription_mrr_cents: i64 = counts
            .iter()
            .map(|(tier, count)| tier.monthly_price_cents() * count)
            .sum();

        let window_start = as_of - Duration::days(TRAILING_WINDOW_DAYS);
        let transaction_fee_mrr_cents = self
            .payments
            .sum_fees_between(window_start, as_of)
            .await?;

        let total_mrr_cents = subscription_mrr_cents + transaction_fee_mrr_cents;

        Ok(MrrReport {
            subscription_mrr_cents,
            transaction_fee_mrr_cents,
            total_mrr_cents,
            arr_cents: total_mrr_cents * MONTHS_PER_YEAR,
        })
    }

    /// Provider counts per tier, active subscriptions only. Feeds both the
    /// revenue breakdown and the plan-distribution report.
    pub async fn get_tier_distribution(&self) -> AppResult<Vec<TierCount>> {
        let counts = self.accounts.count_active_by_tier().await?;
        Ok(counts
            .into_iter()
            .map(|(tier, provider_count)| TierCount {
                tier,
                provider_count,
            })
            .collect())
    }

    pub async fn get_revenue_summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<RevenueSummary> {
        self.payments.summary(from, to).await
    }

    pub async fn list_payments(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayments> {
        self.payments.list_by_provider(provider_id, page, per_page).await
    }

    // ========================================================================
    // Webhook bookkeeping
    // ========================================================================

    pub async fn is_event_processed(&self, event_id: &str) -> AppResult<bool> {
        self.events.exists(event_id).await
    }

    pub async fn mark_event_processed(
        &self,
        event_id: &str,
        event_type: &str,
        provider_id: Option<Uuid>,
        payload: &serde_json::Value,
    ) -> AppResult<()> {
        self.events
            .record(event_id, event_type, provider_id, payload)
            .await
    }
}
