//! The only fee arithmetic in the tree. Every surface that needs a fee
//! amount calls through here; nothing else multiplies an amount by a
//! percentage.

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::plan_tier::PlanTier;

/// Instant payouts cost 1.5% of the requested amount.
pub const INSTANT_PAYOUT_FEE_BPS: i64 = 150;

/// Apply a basis-point rate to an amount, rounding half up.
///
/// Integer-only: fee amounts are persisted and must be exactly re-derivable
/// for audits, so no floating point enters the computation. Round half up
/// rather than banker's rounding - ties always go to the platform, avoiding
/// systematic under-collection.
fn apply_bps(amount_cents: i64, bps: i64) -> i64 {
    (amount_cents * bps + 5_000) / 10_000
}

/// Platform fee on a client payment, from the provider's tier at payment
/// time. Pure: identical inputs always yield identical output.
///
/// A zero-amount payment is valid and carries a zero fee.
pub fn transaction_fee_cents(tier: PlanTier, gross_amount_cents: i64) -> AppResult<i64> {
    if gross_amount_cents < 0 {
        return Err(AppError::InvalidInput(format!(
            "Payment amount must not be negative, got {} cents",
            gross_amount_cents
        )));
    }
    Ok(apply_bps(gross_amount_cents, tier.transaction_fee_bps()))
}

/// Fee on an instant payout. The provider's net receipt is
/// `amount - fee`; standard payouts are fee-free and never call this.
pub fn instant_payout_fee_cents(amount_cents: i64) -> AppResult<i64> {
    if amount_cents < 0 {
        return Err(AppError::InvalidInput(format!(
            "Payout amount must not be negative, got {} cents",
            amount_cents
        )));
    }
    Ok(apply_bps(amount_cents, INSTANT_PAYOUT_FEE_BPS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_tier_200_dollar_payment() {
        // Growth is 2.5%: $200.00 -> $5.00 fee, $195.00 net to the provider
        let fee = transaction_fee_cents(PlanTier::Growth, 20_000).unwrap();
        assert_eq!(fee, 500);
        assert_eq!(20_000 - fee, 19_500);
    }

    #[test]
    fn test_fee_per_tier() {
        // $100.00 across the catalog
        assert_eq!(transaction_fee_cents(PlanTier::Free, 10_000).unwrap(), 800);
        assert_eq!(transaction_fee_cents(PlanTier::Growth, 10_000).unwrap(), 250);
        assert_eq!(transaction_fee_cents(PlanTier::Pro, 10_000).unwrap(), 200);
        assert_eq!(transaction_fee_cents(PlanTier::Scale, 10_000).unwrap(), 150);
    }

    #[test]
    fn test_zero_amount_yields_zero_fee() {
        for tier in PlanTier::ALL {
            assert_eq!(transaction_fee_cents(tier, 0).unwrap(), 0);
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(transaction_fee_cents(PlanTier::Free, -1).is_err());
        assert!(instant_payout_fee_cents(-1).is_err());
    }

    #[test]
    fn test_rounding_half_up() {
        // 2.5% of 19 cents = 0.475 cents -> 0
        assert_eq!(transaction_fee_cents(PlanTier::Growth, 19).unwrap(), 0);
        // 2.5% of 20 cents = 0.5 cents -> rounds up to 1, not to even
        assert_eq!(transaction_fee_cents(PlanTier::Growth, 20).unwrap(), 1);
        // 2.5% of 60 cents = 1.5 cents -> 2 (banker's rounding would give 2
        // here too; the distinguishing case is 0.5 -> 1 above)
        assert_eq!(transaction_fee_cents(PlanTier::Growth, 60).unwrap(), 2);
        // 8% of 6 cents = 0.48 cents -> 0
        assert_eq!(transaction_fee_cents(PlanTier::Free, 6).unwrap(), 0);
    }

    #[test]
    fn test_fee_is_deterministic() {
        for tier in PlanTier::ALL {
            for amount in [0, 1, 99, 10_000, 123_457, 9_999_999] {
                let first = transaction_fee_cents(tier, amount).unwrap();
                let second = transaction_fee_cents(tier, amount).unwrap();
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_instant_payout_fee() {
        // $100.00 -> $1.50 fee, $98.50 net receipt
        let fee = instant_payout_fee_cents(10_000).unwrap();
        assert_eq!(fee, 150);
        assert_eq!(10_000 - fee, 9_850);
    }

    #[test]
    fn test_instant_payout_fee_rounds_half_up() {
        // 1.5% of 33 cents = 0.495 -> 0; 1.5% of 34 = 0.51 -> 1
        assert_eq!(instant_payout_fee_cents(33).unwrap(), 0);
        assert_eq!(instant_payout_fee_cents(34).unwrap(), 1);
        // 1.5% of 100 cents = 1.5 -> 2
        assert_eq!(instant_payout_fee_cents(100).unwrap(), 2);
    }
}
