//! Read-only reporting endpoints for the admin dashboard. All amounts are
//! integer cents; all timestamps ISO-8601.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
};

#[derive(Deserialize)]
struct MrrQuery {
    /// Defaults to now; reports can be re-run for past points in time.
    as_of: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct DateRangeQuery {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct MonthQuery {
    year: i32,
    month: u32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mrr", get(mrr))
        .route("/tier-distribution", get(tier_distribution))
        .route("/revenue-summary", get(revenue_summary))
        .route("/referral-liability", get(referral_liability))
        .route("/referral-expense", get(referral_expense))
}

async fn mrr(
    State(app_state): State<AppState>,
    Query(query): Query<MrrQuery>,
) -> AppResult<impl IntoResponse> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let report = app_state.revenue_use_cases.get_mrr(as_of).await?;
    Ok(Json(report))
}

async fn tier_distribution(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let distribution = app_state.revenue_use_cases.get_tier_distribution().await?;
    Ok(Json(distribution))
}

async fn revenue_summary(
    State(app_state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<impl IntoResponse> {
    let summary = app_state
        .revenue_use_cases
        .get_revenue_summary(query.from, query.to)
        .await?;
    Ok(Json(summary))
}

async fn referral_liability(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let outstanding_cents = app_state
        .credit_use_cases
        .get_outstanding_liability()
        .await?;
    Ok(Json(serde_json::json!({
        "outstanding_cents": outstanding_cents
    })))
}

async fn referral_expense(
    State(app_state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> AppResult<impl IntoResponse> {
    let expense = app_state
        .credit_use_cases
        .get_monthly_expense(query.year, query.month)
        .await?;
    Ok(Json(expense))
}
