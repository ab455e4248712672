use dotenvy::dotenv;
use tracing::info;

use doorstep_billing::infra::{
    app::create_app, maintenance::run_maintenance_loop, setup::init_app_state,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state.clone());

    // Spawn the maintenance loop (after tracing is initialized)
    if app_state.config.maintenance_interval_secs > 0 {
        let payout_use_cases = app_state.payout_use_cases.clone();
        let credit_use_cases = app_state.credit_use_cases.clone();
        let interval_secs = app_state.config.maintenance_interval_secs;
        let credit_expiry_days = app_state.config.credit_expiry_days;
        tokio::spawn(async move {
            run_maintenance_loop(
                payout_use_cases,
                credit_use_cases,
                interval_secs,
                credit_expiry_days,
            )
            .await;
        });
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Billing engine listening at {}", &listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
