//! In-memory mock implementations for the repository traits and the
//! processor port.
//!
//! The payout mock holds its own lock across the whole coverage check +
//! insert, reproducing the row-lock semantics of the Postgres adapter so
//! concurrency tests exercise the same guarantees. Lock order is always
//! payouts -> accounts.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::{
        PaymentProcessorPort, ProcessorBalance, TransferAck, TransferId,
    },
    domain::entities::{
        payment_event::PaymentEvent,
        payout::{PayoutRequest, PayoutStatus, PayoutType},
        plan_tier::PlanTier,
        provider_account::{ProviderAccount, SubscriptionStatus},
        referral_credit::{CreditStatus, ReferralCredit},
    },
    use_cases::{
        payout_scheduler::{PaginatedPayouts, PayoutRecord, PayoutRequestRepo, TransitionOutcome},
        referral_credits::{
            select_redeemable, MonthlyCreditExpense, NewCredit, ReferralCreditRepo,
        },
        revenue_ledger::{
            LedgerEventRepo, PaginatedPayments, PaymentEventRepo, PaymentRecord,
            ProviderAccountRepo, RevenueSummary,
        },
    },
};
use std::sync::Arc;

// ============================================================================
// InMemoryProviderAccountRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryProviderAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, ProviderAccount>>,
}

impl InMemoryProviderAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<ProviderAccount>) -> Self {
        let map: HashMap<Uuid, ProviderAccount> =
            accounts.into_iter().map(|a| (a.id, a)).collect();
        Self {
            accounts: Mutex::new(map),
        }
    }

    /// Credit a balance bucket directly (used by the payment mock, which
    /// pairs the update with the event insert).
    pub fn credit(&self, provider_id: Uuid, net_cents: i64, settled: bool) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&provider_id)
            .ok_or(AppError::NotFound)?;
        if settled {
            account.available_balance_cents += net_cents;
        } else {
            account.pending_balance_cents += net_cents;
        }
        account.updated_at = Some(Utc::now().naive_utc());
        Ok(())
    }

    pub fn debit_available(&self, provider_id: Uuid, amount_cents: i64) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&provider_id)
            .ok_or(AppError::NotFound)?;
        account.available_balance_cents -= amount_cents;
        account.updated_at = Some(Utc::now().naive_utc());
        Ok(())
    }
}

#[async_trait]
impl ProviderAccountRepo for InMemoryProviderAccountRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ProviderAccount>> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn upsert_subscription(
        &self,
        provider_id: Uuid,
        tier: Option<PlanTier>,
        status: SubscriptionStatus,
    ) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let now = Utc::now().naive_utc();
        match accounts.get_mut(&provider_id) {
            Some(account) => {
                if let Some(tier) = tier {
                    account.current_tier = tier;
                }
                account.subscription_status = status;
                account.updated_at = Some(now);
            }
            None => {
                accounts.insert(
                    provider_id,
                    ProviderAccount {
                        id: provider_id,
                        current_tier: tier.unwrap_or_default(),
                        subscription_status: status,
                        payout_delay_days: 2,
                        instant_payout_eligible: false,
                        available_balance_cents: 0,
                        pending_balance_cents: 0,
                        created_at: Some(now),
                        updated_at: Some(now),
                    },
                );
            }
        }
        Ok(())
    }

    async fn count_active_by_tier(&self) -> AppResult<Vec<(PlanTier, i64)>> {
        let accounts = self.accounts.lock().unwrap();
        let mut counts: HashMap<PlanTier, i64> = HashMap::new();
        for account in accounts.values() {
            if account.subscription_status.is_active() {
                *counts.entry(account.current_tier).or_insert(0) += 1;
            }
        }
        Ok(PlanTier::ALL
            .iter()
            .map(|tier| (*tier, counts.get(tier).copied().unwrap_or(0)))
            .collect())
    }

    async fn list_ids(&self) -> AppResult<Vec<Uuid>> {
        Ok(self.accounts.lock().unwrap().keys().copied().collect())
    }

    async fn apply_balance_snapshot(
        &self,
        provider_id: Uuid,
        available_cents: i64,
        pending_cents: i64,
        instant_payout_eligible: bool,
    ) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&provider_id)
            .ok_or(AppError::NotFound)?;
        account.available_balance_cents = available_cents;
        account.pending_balance_cents = pending_cents;
        account.instant_payout_eligible = instant_payout_eligible;
        account.updated_at = Some(Utc::now().naive_utc());
        Ok(())
    }
}

// ============================================================================
// InMemoryPaymentEventRepo
// ============================================================================

pub struct InMemoryPaymentEventRepo {
    pub events: Mutex<Vec<PaymentEvent>>,
    accounts: Arc<InMemoryProviderAccountRepo>,
}

impl InMemoryPaymentEventRepo {
    pub fn new(accounts: Arc<InMemoryProviderAccountRepo>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            accounts,
        }
    }
}

#[async_trait]
impl PaymentEventRepo for InMemoryPaymentEventRepo {
    async fn record(&self, record: &PaymentRecord) -> AppResult<PaymentEvent> {
        let mut events = self.events.lock().unwrap();
        if events.iter().any(|e| e.id == record.id) {
            return Err(AppError::DuplicateEvent(record.id.clone()));
        }

        let event = PaymentEvent {
            id: record.id.clone(),
            provider_id: record.provider_id,
            gross_amount_cents: record.gross_amount_cents,
            fee_amount_cents: record.fee_amount_cents,
            fee_bps: record.fee_bps,
            settlement: record.settlement,
            occurred_at: record.occurred_at,
            recorded_at: Some(Utc::now().naive_utc()),
        };

        // Event insert and balance update succeed or fail together; the
        // events lock is held across both.
        self.accounts.credit(
            record.provider_id,
            event.net_amount_cents(),
            record.settlement.is_settled(),
        )?;
        events.push(event.clone());
        Ok(event)
    }

    async fn sum_fees_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.occurred_at > from && e.occurred_at <= to)
            .map(|e| e.fee_amount_cents)
            .sum())
    }

    async fn summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<RevenueSummary> {
        let events = self.events.lock().unwrap();
        let in_range = events.iter().filter(|e| {
            from.is_none_or(|f| e.occurred_at >= f) && to.is_none_or(|t| e.occurred_at <= t)
        });
        let mut summary = RevenueSummary {
            gross_cents: 0,
            fee_cents: 0,
            payment_count: 0,
        };
        for event in in_range {
            summary.gross_cents += event.gross_amount_cents;
            summary.fee_cents += event.fee_amount_cents;
            summary.payment_count += 1;
        }
        Ok(summary)
    }

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayments> {
        let events = self.events.lock().unwrap();
        let mut matching: Vec<PaymentEvent> = events
            .iter()
            .filter(|e| e.provider_id == provider_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

        let total = matching.len() as i64;
        let offset = ((page - 1) * per_page).max(0) as usize;
        let payments: Vec<PaymentEvent> = matching
            .into_iter()
            .skip(offset)
            .take(per_page.max(0) as usize)
            .collect();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i32;

        Ok(PaginatedPayments {
            payments,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}

// ============================================================================
// InMemoryLedgerEventRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryLedgerEventRepo {
    pub events: Mutex<HashMap<String, String>>,
}

impl InMemoryLedgerEventRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerEventRepo for InMemoryLedgerEventRepo {
    async fn record(
        &self,
        event_id: &str,
        event_type: &str,
        _provider_id: Option<Uuid>,
        _payload: &serde_json::Value,
    ) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .insert(event_id.to_string(), event_type.to_string());
        Ok(())
    }

    async fn exists(&self, event_id: &str) -> AppResult<bool> {
        Ok(self.events.lock().unwrap().contains_key(event_id))
    }
}

// ============================================================================
// InMemoryPayoutRequestRepo
// ============================================================================

pub struct InMemoryPayoutRequestRepo {
    pub payouts: Mutex<Vec<PayoutRequest>>,
    accounts: Arc<InMemoryProviderAccountRepo>,
}

impl InMemoryPayoutRequestRepo {
    pub fn new(accounts: Arc<InMemoryProviderAccountRepo>) -> Self {
        Self {
            payouts: Mutex::new(Vec::new()),
            accounts,
        }
    }
}

#[async_trait]
impl PayoutRequestRepo for InMemoryPayoutRequestRepo {
    async fn create_covered(&self, record: &PayoutRecord) -> AppResult<PayoutRequest> {
        // The payouts lock is held across the coverage check and the insert,
        // standing in for the provider row lock of the Postgres adapter.
        let mut payouts = self.payouts.lock().unwrap();

        let available = self
            .accounts
            .accounts
            .lock()
            .unwrap()
            .get(&record.provider_id)
            .ok_or(AppError::NotFound)?
            .available_balance_cents;

        let reserved: i64 = payouts
            .iter()
            .filter(|p| p.provider_id == record.provider_id && p.status == PayoutStatus::Requested)
            .map(|p| p.amount_cents)
            .sum();

        if record.amount_cents + reserved > available {
            return Err(AppError::InsufficientBalance {
                requested: record.amount_cents,
                available: available - reserved,
            });
        }

        let payout = PayoutRequest {
            id: record.id,
            provider_id: record.provider_id,
            payout_type: record.payout_type,
            amount_cents: record.amount_cents,
            fee_cents: record.fee_cents,
            status: PayoutStatus::Requested,
            requested_at: record.requested_at,
            expected_arrival: record.expected_arrival,
            updated_at: Some(Utc::now().naive_utc()),
        };
        payouts.push(payout.clone());
        Ok(payout)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PayoutRequest>> {
        Ok(self
            .payouts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn transition(
        &self,
        payout_id: Uuid,
        new_status: PayoutStatus,
    ) -> AppResult<TransitionOutcome> {
        let mut payouts = self.payouts.lock().unwrap();
        let payout = payouts
            .iter_mut()
            .find(|p| p.id == payout_id)
            .ok_or(AppError::NotFound)?;

        if !payout.status.can_transition_to(new_status) {
            return Ok(TransitionOutcome::Skipped);
        }

        // Confirmed acceptance is the only place the balance is decremented.
        if payout.status == PayoutStatus::Requested && new_status == PayoutStatus::InTransit {
            self.accounts
                .debit_available(payout.provider_id, payout.amount_cents)?;
        }

        payout.status = new_status;
        payout.updated_at = Some(Utc::now().naive_utc());
        Ok(TransitionOutcome::Applied)
    }

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayouts> {
        let payouts = self.payouts.lock().unwrap();
        let mut matching: Vec<PayoutRequest> = payouts
            .iter()
            .filter(|p| p.provider_id == provider_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));

        let total = matching.len() as i64;
        let offset = ((page - 1) * per_page).max(0) as usize;
        let payouts: Vec<PayoutRequest> = matching
            .into_iter()
            .skip(offset)
            .take(per_page.max(0) as usize)
            .collect();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i32;

        Ok(PaginatedPayouts {
            payouts,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}

// ============================================================================
// InMemoryReferralCreditRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryReferralCreditRepo {
    pub credits: Mutex<Vec<ReferralCredit>>,
}

impl InMemoryReferralCreditRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferralCreditRepo for InMemoryReferralCreditRepo {
    async fn insert(
        &self,
        credit: &NewCredit,
        issued_at: DateTime<Utc>,
    ) -> AppResult<ReferralCredit> {
        let mut credits = self.credits.lock().unwrap();
        if credits.iter().any(|c| c.external_id == credit.external_id) {
            return Err(AppError::DuplicateEvent(credit.external_id.clone()));
        }

        let issued = ReferralCredit {
            id: Uuid::new_v4(),
            external_id: credit.external_id.clone(),
            referrer_id: credit.referrer_id,
            amount_cents: credit.amount_cents,
            status: CreditStatus::Pending,
            issued_at,
            redeemed_at: None,
            expired_at: None,
        };
        credits.push(issued.clone());
        Ok(issued)
    }

    async fn redeem_pending_fifo(
        &self,
        referrer_id: Uuid,
        up_to_amount_cents: i64,
        redeemed_at: DateTime<Utc>,
    ) -> AppResult<i64> {
        let mut credits = self.credits.lock().unwrap();

        let mut pending: Vec<(Uuid, i64, DateTime<Utc>)> = credits
            .iter()
            .filter(|c| c.referrer_id == referrer_id && c.status == CreditStatus::Pending)
            .map(|c| (c.id, c.amount_cents, c.issued_at))
            .collect();
        pending.sort_by(|a, b| a.2.cmp(&b.2));
        let candidates: Vec<(Uuid, i64)> = pending.iter().map(|(id, amt, _)| (*id, *amt)).collect();

        let (selected, redeemed_cents) = select_redeemable(&candidates, up_to_amount_cents);

        for credit in credits.iter_mut() {
            if selected.contains(&credit.id) {
                credit.status = CreditStatus::Redeemed;
                credit.redeemed_at = Some(redeemed_at);
            }
        }
        Ok(redeemed_cents)
    }

    async fn sum_outstanding(&self) -> AppResult<i64> {
        Ok(self
            .credits
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.status.is_outstanding())
            .map(|c| c.amount_cents)
            .sum())
    }

    async fn monthly_expense(&self, year: i32, month: u32) -> AppResult<MonthlyCreditExpense> {
        let credits = self.credits.lock().unwrap();
        let issued_cents = credits
            .iter()
            .filter(|c| c.issued_at.year() == year && c.issued_at.month() == month)
            .map(|c| c.amount_cents)
            .sum();
        let redeemed_cents = credits
            .iter()
            .filter(|c| {
                c.redeemed_at
                    .is_some_and(|at| at.year() == year && at.month() == month)
            })
            .map(|c| c.amount_cents)
            .sum();
        Ok(MonthlyCreditExpense {
            issued_cents,
            redeemed_cents,
        })
    }

    async fn expire_issued_before(
        &self,
        cutoff: DateTime<Utc>,
        expired_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut credits = self.credits.lock().unwrap();
        let mut count = 0;
        for credit in credits.iter_mut() {
            if credit.status == CreditStatus::Pending && credit.issued_at < cutoff {
                credit.status = CreditStatus::Expired;
                credit.expired_at = Some(expired_at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_by_referrer(&self, referrer_id: Uuid) -> AppResult<Vec<ReferralCredit>> {
        Ok(self
            .credits
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.referrer_id == referrer_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// MockProcessor
// ============================================================================

/// Processor port stub: either accepts every transfer or is hard down.
pub struct MockProcessor {
    available: bool,
    pub balance: Mutex<ProcessorBalance>,
}

impl MockProcessor {
    pub fn accepting() -> Self {
        Self {
            available: true,
            balance: Mutex::new(ProcessorBalance {
                available_cents: 0,
                pending_cents: 0,
                instant_payout_eligible: false,
            }),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            balance: Mutex::new(ProcessorBalance {
                available_cents: 0,
                pending_cents: 0,
                instant_payout_eligible: false,
            }),
        }
    }

    pub fn with_balance(balance: ProcessorBalance) -> Self {
        Self {
            available: true,
            balance: Mutex::new(balance),
        }
    }
}

#[async_trait]
impl PaymentProcessorPort for MockProcessor {
    async fn request_transfer(
        &self,
        payout_id: Uuid,
        _provider_id: Uuid,
        _amount_cents: i64,
        _payout_type: PayoutType,
    ) -> AppResult<TransferAck> {
        if !self.available {
            return Err(AppError::ProcessorUnavailable(
                "connection timed out".into(),
            ));
        }
        Ok(TransferAck {
            transfer_id: TransferId::new(format!("tr_{}", payout_id.simple())),
            accepted: true,
        })
    }

    async fn fetch_balance(&self, _provider_id: Uuid) -> AppResult<ProcessorBalance> {
        if !self.available {
            return Err(AppError::ProcessorUnavailable(
                "connection timed out".into(),
            ));
        }
        Ok(self.balance.lock().unwrap().clone())
    }
}
