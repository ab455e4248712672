//! Provider-facing payout and payment-history endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
};

#[derive(Deserialize)]
struct PayoutPayload {
    amount_cents: i64,
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: i32,
    #[serde(default = "default_per_page")]
    per_page: i32,
}

fn default_page() -> i32 {
    1
}

fn default_per_page() -> i32 {
    20
}

#[derive(Deserialize)]
struct RedeemPayload {
    up_to_amount_cents: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/payouts/standard", post(request_standard_payout))
        .route("/{id}/payouts/instant", post(request_instant_payout))
        .route("/{id}/payouts", get(list_payouts))
        .route("/{id}/payments", get(list_payments))
        .route("/{id}/credits/redeem", post(redeem_credits))
        .route("/{id}/credits", get(list_credits))
}

async fn request_standard_payout(
    State(app_state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<PayoutPayload>,
) -> AppResult<impl IntoResponse> {
    let payout = app_state
        .payout_use_cases
        .request_standard_payout(provider_id, payload.amount_cents)
        .await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

async fn request_instant_payout(
    State(app_state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<PayoutPayload>,
) -> AppResult<impl IntoResponse> {
    let payout = app_state
        .payout_use_cases
        .request_instant_payout(provider_id, payload.amount_cents)
        .await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

async fn list_payouts(
    State(app_state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let payouts = app_state
        .payout_use_cases
        .list_payouts(provider_id, query.page, query.per_page)
        .await?;
    Ok(Json(payouts))
}

async fn list_payments(
    State(app_state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let payments = app_state
        .revenue_use_cases
        .list_payments(provider_id, query.page, query.per_page)
        .await?;
    Ok(Json(payments))
}

async fn redeem_credits(
    State(app_state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<RedeemPayload>,
) -> AppResult<impl IntoResponse> {
    let redeemed_cents = app_state
        .credit_use_cases
        .redeem_credits(provider_id, payload.up_to_amount_cents)
        .await?;
    Ok(Json(serde_json::json!({ "redeemed_cents": redeemed_cents })))
}

async fn list_credits(
    State(app_state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let credits = app_state.credit_use_cases.list_credits(provider_id).await?;
    Ok(Json(credits))
}
