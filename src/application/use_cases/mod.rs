pub mod payout_scheduler;
pub mod referral_credits;
pub mod revenue_ledger;
