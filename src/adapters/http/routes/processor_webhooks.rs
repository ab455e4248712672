//! Payment processor webhook handler.
//!
//! Every notification is signature-verified, parsed into the strict event
//! union, deduplicated on its event id, and dispatched inside one ledger
//! operation. Delivery is at-least-once: replays return 200 without touching
//! state, transient failures return 500 so the processor redelivers.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use secrecy::ExposeSecret;
use tracing::error;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::{plan_tier::PlanTier, processor_event::ProcessorEvent},
    infra::processor_client::verify_webhook_signature,
    use_cases::revenue_ledger::NewPayment,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// Returns 500 so the processor redelivers the event. Logged with full
/// context for debugging.
fn webhook_retryable_error(error: &AppError, event_type: &str, event_id: &str) -> StatusCode {
    error!(
        error = %error,
        event_type,
        event_id,
        retryable = true,
        "Webhook processing failed, returning 500 for processor retry"
    );
    StatusCode::INTERNAL_SERVER_ERROR
}

/// POST /api/processor/webhook
async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get("doorstep-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidInput("Missing processor signature".into()))?;

    verify_webhook_signature(
        &body,
        signature,
        app_state.config.processor_webhook_secret.expose_secret(),
    )?;

    // Strict union: unknown event kinds are rejected here, not passed through.
    let event: ProcessorEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Unknown or malformed event shape: {}", e)))?;
    let payload: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    let event_id = event.event_id().to_string();
    let event_type = event.event_type();

    // Check idempotency
    if app_state
        .revenue_use_cases
        .is_event_processed(&event_id)
        .await?
    {
        return Ok(StatusCode::OK);
    }

    let result = dispatch(&app_state, &event).await;

    match result {
        Ok(()) => {}
        // The per-record idempotency key caught a replay the audit table had
        // not seen yet; the event is recorded, this delivery is a success.
        Err(AppError::DuplicateEvent(_)) => {}
        Err(err) if err.is_retryable() => {
            return Ok(webhook_retryable_error(&err, event_type, &event_id));
        }
        Err(err) => return Err(err),
    }

    app_state
        .revenue_use_cases
        .mark_event_processed(&event_id, event_type, event.provider_id(), &payload)
        .await?;

    Ok(StatusCode::OK)
}

async fn dispatch(app_state: &AppState, event: &ProcessorEvent) -> AppResult<()> {
    match event {
        ProcessorEvent::PaymentCompleted {
            id,
            provider_id,
            gross_amount_cents,
            settlement,
            occurred_at,
        } => {
            app_state
                .revenue_use_cases
                .record_payment(NewPayment {
                    id: id.clone(),
                    provider_id: *provider_id,
                    gross_amount_cents: *gross_amount_cents,
                    settlement: *settlement,
                    occurred_at: *occurred_at,
                })
                .await?;
        }
        ProcessorEvent::PayoutStatusChanged {
            payout_id, status, ..
        } => {
            app_state
                .payout_use_cases
                .apply_status(*payout_id, *status)
                .await?;
        }
        ProcessorEvent::SubscriptionActivated {
            provider_id, tier, ..
        } => {
            let tier: PlanTier = tier
                .parse()
                .map_err(|_| AppError::UnknownTier(tier.clone()))?;
            app_state
                .revenue_use_cases
                .record_subscription_active(*provider_id, tier)
                .await?;
        }
        ProcessorEvent::SubscriptionCanceled { provider_id, .. } => {
            app_state
                .revenue_use_cases
                .record_subscription_canceled(*provider_id)
                .await?;
        }
    }
    Ok(())
}
