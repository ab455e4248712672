use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub database_url: String,
    /// Base URL of the payment processor API.
    pub processor_base_url: Url,
    /// API key for outbound processor calls (transfer requests, balance reads).
    pub processor_api_key: SecretString,
    /// Shared secret for verifying inbound processor webhook signatures.
    pub processor_webhook_secret: SecretString,
    /// Timeout for processor calls. Expiry surfaces as a retryable error,
    /// never as silent success.
    pub processor_timeout_secs: u64,
    /// Interval of the maintenance loop (balance reconciliation + credit
    /// expiry). 0 disables the loop.
    pub maintenance_interval_secs: u64,
    /// Pending referral credits older than this many days expire.
    pub credit_expiry_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3002".parse().unwrap());
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let database_url: String = get_env("DATABASE_URL");

        let processor_base_url: Url = get_env("PROCESSOR_BASE_URL");
        let processor_api_key: SecretString =
            SecretString::new(get_env::<String>("PROCESSOR_API_KEY").into());
        let processor_webhook_secret: SecretString =
            SecretString::new(get_env::<String>("PROCESSOR_WEBHOOK_SECRET").into());
        let processor_timeout_secs: u64 = get_env_default("PROCESSOR_TIMEOUT_SECS", 10);

        let maintenance_interval_secs: u64 = get_env_default("MAINTENANCE_INTERVAL_SECS", 300);
        let credit_expiry_days: i64 = get_env_default("CREDIT_EXPIRY_DAYS", 365);

        Self {
            bind_addr,
            cors_origin,
            database_url,
            processor_base_url,
            processor_api_key,
            processor_webhook_secret,
            processor_timeout_secs,
            maintenance_interval_secs,
            credit_expiry_days,
        }
    }
}
