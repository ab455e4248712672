//! Periodic maintenance: balance reconciliation against the processor and
//! referral-credit expiry. The only long-running work in the engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::use_cases::{
    payout_scheduler::PayoutUseCases, referral_credits::ReferralCreditUseCases,
};

pub async fn run_maintenance_loop(
    payout_use_cases: Arc<PayoutUseCases>,
    credit_use_cases: Arc<ReferralCreditUseCases>,
    interval_secs: u64,
    credit_expiry_days: i64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs));

    info!(
        interval_secs,
        credit_expiry_days, "Maintenance loop started"
    );

    loop {
        ticker.tick().await;

        match payout_use_cases.reconcile_balances().await {
            Ok(synced) => {
                if synced > 0 {
                    info!(synced, "Reconciled provider balances");
                }
            }
            Err(e) => error!(error = %e, "Balance reconciliation sweep failed"),
        }

        let cutoff = Utc::now() - chrono::Duration::days(credit_expiry_days);
        if let Err(e) = credit_use_cases.expire_credits(cutoff).await {
            error!(error = %e, "Credit expiry sweep failed");
        }
    }
}
