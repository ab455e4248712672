//! Referral-credit issuance, called by the referral qualification service
//! once a referral milestone qualifies. Qualification logic lives there;
//! this engine only accounts for the credit, idempotently.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    use_cases::referral_credits::NewCredit,
};

#[derive(Deserialize)]
struct IssueCreditPayload {
    external_id: String,
    referrer_id: Uuid,
    amount_cents: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/credits", post(issue_credit))
}

async fn issue_credit(
    State(app_state): State<AppState>,
    Json(payload): Json<IssueCreditPayload>,
) -> AppResult<impl IntoResponse> {
    let credit = app_state
        .credit_use_cases
        .issue_credit(NewCredit {
            external_id: payload.external_id,
            referrer_id: payload.referrer_id,
            amount_cents: payload.amount_cents,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(credit)))
}
