//! Test app state builder for HTTP-level integration testing.
//!
//! Creates a minimal `AppState` backed by in-memory mocks.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::ports::payment_processor::PaymentProcessorPort,
    domain::entities::provider_account::ProviderAccount,
    infra::config::AppConfig,
    test_utils::mocks::{
        InMemoryLedgerEventRepo, InMemoryPaymentEventRepo, InMemoryPayoutRequestRepo,
        InMemoryProviderAccountRepo, InMemoryReferralCreditRepo, MockProcessor,
    },
    use_cases::{
        payout_scheduler::PayoutUseCases, referral_credits::ReferralCreditUseCases,
        revenue_ledger::RevenueLedgerUseCases,
    },
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        database_url: "postgres://unused".to_string(),
        processor_base_url: Url::parse("http://127.0.0.1:9").unwrap(),
        processor_api_key: SecretString::new("sk_test_key".into()),
        processor_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        processor_timeout_secs: 1,
        maintenance_interval_secs: 0,
        credit_expiry_days: 365,
    }
}

pub struct TestAppStateBuilder {
    accounts: Arc<InMemoryProviderAccountRepo>,
    payments: Arc<InMemoryPaymentEventRepo>,
    events: Arc<InMemoryLedgerEventRepo>,
    payouts: Arc<InMemoryPayoutRequestRepo>,
    credits: Arc<InMemoryReferralCreditRepo>,
    processor: Arc<dyn PaymentProcessorPort>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        let accounts = Arc::new(InMemoryProviderAccountRepo::new());
        let payments = Arc::new(InMemoryPaymentEventRepo::new(accounts.clone()));
        let payouts = Arc::new(InMemoryPayoutRequestRepo::new(accounts.clone()));
        Self {
            accounts,
            payments,
            events: Arc::new(InMemoryLedgerEventRepo::new()),
            payouts,
            credits: Arc::new(InMemoryReferralCreditRepo::new()),
            processor: Arc::new(MockProcessor::accepting()),
        }
    }

    pub fn with_account(self, account: ProviderAccount) -> Self {
        self.accounts
            .accounts
            .lock()
            .unwrap()
            .insert(account.id, account);
        self
    }

    pub fn with_processor(mut self, processor: Arc<dyn PaymentProcessorPort>) -> Self {
        self.processor = processor;
        self
    }

    /// Handle to the account store, for asserting on balances after requests.
    pub fn accounts(&self) -> Arc<InMemoryProviderAccountRepo> {
        self.accounts.clone()
    }

    pub fn credits(&self) -> Arc<InMemoryReferralCreditRepo> {
        self.credits.clone()
    }

    pub fn revenue_use_cases(&self) -> Arc<RevenueLedgerUseCases> {
        Arc::new(RevenueLedgerUseCases::new(
            self.accounts.clone(),
            self.payments.clone(),
            self.events.clone(),
        ))
    }

    pub fn build(self) -> AppState {
        let revenue_use_cases = Arc::new(RevenueLedgerUseCases::new(
            self.accounts.clone(),
            self.payments.clone(),
            self.events.clone(),
        ));
        let payout_use_cases = Arc::new(PayoutUseCases::new(
            self.accounts.clone(),
            self.payouts.clone(),
            self.processor.clone(),
        ));
        let credit_use_cases = Arc::new(ReferralCreditUseCases::new(self.credits.clone()));

        AppState {
            config: Arc::new(test_config()),
            revenue_use_cases,
            payout_use_cases,
            credit_use_cases,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
