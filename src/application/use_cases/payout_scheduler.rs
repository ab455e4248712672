use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        business_days::next_business_day,
        fees,
        ports::payment_processor::PaymentProcessorPort,
    },
    domain::entities::payout::{PayoutRequest, PayoutStatus, PayoutType},
};

/// Instant payouts typically land within half an hour. An estimate shown to
/// the provider, not a guarantee - the actual arrival is whatever the
/// processor reports.
const INSTANT_ARRIVAL_MINUTES: i64 = 30;

// ============================================================================
// Input / Report Types
// ============================================================================

/// Fully-computed payout handed to the persistence layer. Creation must be
/// refused when the amount (plus already-requested payouts) exceeds the
/// provider's available balance.
#[derive(Debug, Clone)]
pub struct PayoutRecord {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub payout_type: PayoutType,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub requested_at: DateTime<Utc>,
    pub expected_arrival: DateTime<Utc>,
}

/// Outcome of a guarded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The transition was invalid from the payout's current status (replay
    /// or out-of-order notification) and changed nothing.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedPayouts {
    pub payouts: Vec<PayoutRequest>,
    pub total: i64,
    pub page: i32,
    pub per_page: i32,
    pub total_pages: i32,
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait PayoutRequestRepo: Send + Sync {
    /// Create a payout in `requested` status, atomically verifying coverage:
    /// the amount plus all still-`requested` payout amounts for the provider
    /// must fit in the available balance, checked under a provider row lock
    /// so two concurrent requests cannot both pass against the same
    /// headroom. Fails with `InsufficientBalance` otherwise.
    ///
    /// The balance itself is NOT decremented here.
    async fn create_covered(&self, record: &PayoutRecord) -> AppResult<PayoutRequest>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PayoutRequest>>;

    /// Apply a status transition if it is valid from the current status.
    /// `requested -> in_transit` additionally decrements the provider's
    /// available balance by the payout amount, in the same transaction -
    /// the only place the engine ever decrements a balance for a payout.
    async fn transition(
        &self,
        payout_id: Uuid,
        new_status: PayoutStatus,
    ) -> AppResult<TransitionOutcome>;

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayouts>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct PayoutUseCases {
    accounts: Arc<dyn crate::use_cases::revenue_ledger::ProviderAccountRepo>,
    payouts: Arc<dyn PayoutRequestRepo>,
    processor: Arc<dyn PaymentProcessorPort>,
}

impl PayoutUseCases {
    pub fn new(
        accounts: Arc<dyn crate::use_cases::revenue_ledger::ProviderAccountRepo>,
        payouts: Arc<dyn PayoutRequestRepo>,
        processor: Arc<dyn PaymentProcessorPort>,
    ) -> Self {
        Self {
            accounts,
            payouts,
            processor,
        }
    }

    /// Fee-free payout arriving after the provider's configured number of
    /// business days.
    pub async fn request_standard_payout(
        &self,
        provider_id: Uuid,
        amount_cents: i64,
    ) -> AppResult<PayoutRequest> {
        let account = self
            .accounts
            .get_by_id(provider_id)
            .await?
            .ok_or(AppError::NotFound)?;
        validate_amount(amount_cents)?;

        let now = Utc::now();
        let arrival_date =
            next_business_day(now.date_naive(), account.payout_delay_days.max(0) as u32);
        // Date-precision estimate; midnight UTC of the arrival day.
        let expected_arrival = arrival_date
            .and_time(NaiveTime::MIN)
            .and_utc();

        let record = PayoutRecord {
            id: Uuid::new_v4(),
            provider_id,
            payout_type: PayoutType::Standard,
            amount_cents,
            fee_cents: 0,
            requested_at: now,
            expected_arrival,
        };

        self.submit(record).await
    }

    /// Fee-bearing payout arriving in roughly half an hour. Requires a debit
    /// card on file, a fact the processor reports and this engine only
    /// relays.
    pub async fn request_instant_payout(
        &self,
        provider_id: Uuid,
        amount_cents: i64,
    ) -> AppResult<PayoutRequest> {
        let account = self
            .accounts
            .get_by_id(provider_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if !account.instant_payout_eligible {
            return Err(AppError::InstantPayoutIneligible);
        }
        validate_amount(amount_cents)?;

        let fee_cents = fees::instant_payout_fee_cents(amount_cents)?;
        let now = Utc::now();

        let record = PayoutRecord {
            id: Uuid::new_v4(),
            provider_id,
            payout_type: PayoutType::Instant,
            amount_cents,
            fee_cents,
            requested_at: now,
            expected_arrival: now + Duration::minutes(INSTANT_ARRIVAL_MINUTES),
        };

        self.submit(record).await
    }

    /// Persist the request, then ask the processor to execute the transfer.
    ///
    /// If the processor is unreachable the just-created payout is marked
    /// failed (terminal - it surfaces to the provider for manual re-request)
    /// and the error propagates as retryable; a retry creates a fresh payout
    /// and can never double-submit this one.
    async fn submit(&self, record: PayoutRecord) -> AppResult<PayoutRequest> {
        let payout = self.payouts.create_covered(&record).await?;

        match self
            .processor
            .request_transfer(
                payout.id,
                payout.provider_id,
                payout.amount_cents,
                payout.payout_type,
            )
            .await
        {
            Ok(ack) => {
                tracing::info!(
                    payout_id = %payout.id,
                    provider_id = %payout.provider_id,
                    transfer_id = %ack.transfer_id,
                    payout_type = %payout.payout_type,
                    amount_cents = payout.amount_cents,
                    fee_cents = payout.fee_cents,
                    "Payout transfer requested"
                );
                Ok(payout)
            }
            Err(err) => {
                tracing::error!(
                    payout_id = %payout.id,
                    provider_id = %payout.provider_id,
                    error = %err,
                    "Processor refused payout transfer, marking failed"
                );
                self.payouts
                    .transition(payout.id, PayoutStatus::Failed)
                    .await?;
                Err(err)
            }
        }
    }

    /// Apply a processor-reported status change.
    ///
    /// Transitions are guarded by the payout state machine; replayed or
    /// out-of-order notifications (at-least-once delivery) affect nothing
    /// and are logged. The available balance is decremented exactly once,
    /// on the confirmed `requested -> in_transit` transition.
    pub async fn apply_status(
        &self,
        payout_id: Uuid,
        new_status: PayoutStatus,
    ) -> AppResult<()> {
        let outcome = self.payouts.transition(payout_id, new_status).await?;
        match outcome {
            TransitionOutcome::Applied => {
                tracing::info!(
                    payout_id = %payout_id,
                    status = %new_status,
                    "Payout status updated"
                );
            }
            TransitionOutcome::Skipped => {
                tracing::warn!(
                    payout_id = %payout_id,
                    status = %new_status,
                    "Payout status notification skipped - not a valid transition from current status"
                );
            }
        }
        Ok(())
    }

    pub async fn list_payouts(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayouts> {
        self.payouts.list_by_provider(provider_id, page, per_page).await
    }

    /// Sweep all provider accounts, folding the processor's reported balance
    /// and instant-payout eligibility back into the engine's view.
    ///
    /// A provider the processor cannot answer for is skipped and retried on
    /// the next sweep; the sweep itself never fails over one provider.
    pub async fn reconcile_balances(&self) -> AppResult<u64> {
        let ids = self.accounts.list_ids().await?;
        let mut synced = 0;
        for provider_id in ids {
            match self.processor.fetch_balance(provider_id).await {
                Ok(balance) => {
                    self.accounts
                        .apply_balance_snapshot(
                            provider_id,
                            balance.available_cents,
                            balance.pending_cents,
                            balance.instant_payout_eligible,
                        )
                        .await?;
                    synced += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        provider_id = %provider_id,
                        error = %err,
                        "Balance reconciliation skipped provider"
                    );
                }
            }
        }
        Ok(synced)
    }
}

fn validate_amount(amount_cents: i64) -> AppResult<()> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidInput(format!(
            "Payout amount must be positive, got {} cents",
            amount_cents
        )));
    }
    Ok(())
}
