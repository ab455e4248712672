use std::sync::Arc;

use crate::{
    application::use_cases::{
        payout_scheduler::PayoutUseCases, referral_credits::ReferralCreditUseCases,
        revenue_ledger::RevenueLedgerUseCases,
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub revenue_use_cases: Arc<RevenueLedgerUseCases>,
    pub payout_use_cases: Arc<PayoutUseCases>,
    pub credit_use_cases: Arc<ReferralCreditUseCases>,
}
