use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::ports::payment_processor::PaymentProcessorPort,
    infra::{config::AppConfig, db, processor_client::ProcessorClient},
    use_cases::{
        payout_scheduler::{PayoutRequestRepo, PayoutUseCases},
        referral_credits::{ReferralCreditRepo, ReferralCreditUseCases},
        revenue_ledger::{
            LedgerEventRepo, PaymentEventRepo, ProviderAccountRepo, RevenueLedgerUseCases,
        },
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = db::connect(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let account_repo = postgres_arc.clone() as Arc<dyn ProviderAccountRepo>;
    let payment_repo = postgres_arc.clone() as Arc<dyn PaymentEventRepo>;
    let event_repo = postgres_arc.clone() as Arc<dyn LedgerEventRepo>;
    let payout_repo = postgres_arc.clone() as Arc<dyn PayoutRequestRepo>;
    let credit_repo = postgres_arc.clone() as Arc<dyn ReferralCreditRepo>;

    let processor = Arc::new(ProcessorClient::new(
        config.processor_base_url.clone(),
        config.processor_api_key.clone(),
        config.processor_timeout_secs,
    )) as Arc<dyn PaymentProcessorPort>;

    let revenue_use_cases = RevenueLedgerUseCases::new(
        account_repo.clone(),
        payment_repo,
        event_repo,
    );
    let payout_use_cases = PayoutUseCases::new(account_repo, payout_repo, processor);
    let credit_use_cases = ReferralCreditUseCases::new(credit_repo);

    Ok(AppState {
        config: Arc::new(config),
        revenue_use_cases: Arc::new(revenue_use_cases),
        payout_use_cases: Arc::new(payout_use_cases),
        credit_use_cases: Arc::new(credit_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "doorstep_billing=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
