pub mod payment_event;
pub mod payout;
pub mod plan_tier;
pub mod processor_event;
pub mod provider_account;
pub mod referral_credit;
