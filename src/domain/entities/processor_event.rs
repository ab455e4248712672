use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{payment_event::SettlementState, payout::PayoutStatus};

/// Strict tagged union of the processor notifications this engine ingests.
///
/// Webhook payloads deserialize into exactly one of these kinds; anything
/// else fails to parse and is rejected at the boundary instead of being
/// passed through as loose JSON. Extra fields inside a known kind are
/// ignored (processors add fields without notice), unknown kinds are not.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ProcessorEvent {
    /// A client payment completed against a provider.
    #[serde(rename = "payment.completed")]
    PaymentCompleted {
        id: String,
        provider_id: Uuid,
        gross_amount_cents: i64,
        settlement: SettlementState,
        occurred_at: DateTime<Utc>,
    },

    /// The processor moved a payout through its lifecycle.
    #[serde(rename = "payout.status_changed")]
    PayoutStatusChanged {
        id: String,
        payout_id: Uuid,
        status: PayoutStatus,
        occurred_at: DateTime<Utc>,
    },

    /// A provider subscription became (or stayed) active on a tier.
    /// The tier arrives as a string and is validated against the closed
    /// catalog during dispatch.
    #[serde(rename = "subscription.activated")]
    SubscriptionActivated {
        id: String,
        provider_id: Uuid,
        tier: String,
        occurred_at: DateTime<Utc>,
    },

    /// A provider subscription was canceled.
    #[serde(rename = "subscription.canceled")]
    SubscriptionCanceled {
        id: String,
        provider_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
}

impl ProcessorEvent {
    /// The processor's event id - the idempotency key for delivery.
    pub fn event_id(&self) -> &str {
        match self {
            ProcessorEvent::PaymentCompleted { id, .. } => id,
            ProcessorEvent::PayoutStatusChanged { id, .. } => id,
            ProcessorEvent::SubscriptionActivated { id, .. } => id,
            ProcessorEvent::SubscriptionCanceled { id, .. } => id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ProcessorEvent::PaymentCompleted { .. } => "payment.completed",
            ProcessorEvent::PayoutStatusChanged { .. } => "payout.status_changed",
            ProcessorEvent::SubscriptionActivated { .. } => "subscription.activated",
            ProcessorEvent::SubscriptionCanceled { .. } => "subscription.canceled",
        }
    }

    pub fn provider_id(&self) -> Option<Uuid> {
        match self {
            ProcessorEvent::PaymentCompleted { provider_id, .. } => Some(*provider_id),
            ProcessorEvent::PayoutStatusChanged { .. } => None,
            ProcessorEvent::SubscriptionActivated { provider_id, .. } => Some(*provider_id),
            ProcessorEvent::SubscriptionCanceled { provider_id, .. } => Some(*provider_id),
        }
    }
}
