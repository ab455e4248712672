pub mod payouts;
pub mod processor_webhooks;
pub mod referrals;
pub mod reports;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/processor", processor_webhooks::router())
        .nest("/providers", payouts::router())
        .nest("/referrals", referrals::router())
        .nest("/reports", reports::router())
}
