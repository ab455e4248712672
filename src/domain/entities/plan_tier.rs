use serde::{Deserialize, Serialize};

/// Subscription tier for a provider organization.
///
/// The catalog is a closed set: adding a tier is a code change plus a data
/// migration, never a runtime write. Pricing follows the "pay more fixed,
/// pay less variable" rule - the transaction fee strictly decreases as the
/// monthly price increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PlanTier {
    #[default]
    Free,
    Growth,
    Pro,
    Scale,
}

/// Immutable per-tier pricing attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanPricing {
    pub monthly_price_cents: i64,
    pub transaction_fee_bps: i64,
}

impl PlanTier {
    /// All tiers, ordered by ascending monthly price.
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Growth,
        PlanTier::Pro,
        PlanTier::Scale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Growth => "growth",
            PlanTier::Pro => "pro",
            PlanTier::Scale => "scale",
        }
    }

    /// Catalog lookup. Infallible for enum values; parsing external strings
    /// goes through `FromStr` which rejects anything outside the closed set.
    pub fn pricing(&self) -> PlanPricing {
        match self {
            PlanTier::Free => PlanPricing {
                monthly_price_cents: 0,
                transaction_fee_bps: 800,
            },
            PlanTier::Growth => PlanPricing {
                monthly_price_cents: 4_900,
                transaction_fee_bps: 250,
            },
            PlanTier::Pro => PlanPricing {
                monthly_price_cents: 9_900,
                transaction_fee_bps: 200,
            },
            PlanTier::Scale => PlanPricing {
                monthly_price_cents: 29_900,
                transaction_fee_bps: 150,
            },
        }
    }

    pub fn monthly_price_cents(&self) -> i64 {
        self.pricing().monthly_price_cents
    }

    pub fn transaction_fee_bps(&self) -> i64 {
        self.pricing().transaction_fee_bps
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "growth" => Ok(PlanTier::Growth),
            "pro" => Ok(PlanTier::Pro),
            "scale" => Ok(PlanTier::Scale),
            _ => Err(format!(
                "Invalid plan tier: {}. Must be one of 'free', 'growth', 'pro', 'scale'",
                s
            )),
        }
    }
}
