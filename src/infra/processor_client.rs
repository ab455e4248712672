use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::{PaymentProcessorPort, ProcessorBalance, TransferAck},
    domain::entities::payout::PayoutType,
};

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// Webhook signatures
// ============================================================================

/// Verify a processor webhook signature of the form `t=<ts>,v1=<hex>`, an
/// HMAC-SHA256 over `"{timestamp}.{body}"`.
pub fn verify_webhook_signature(body: &str, signature: &str, secret: &str) -> AppResult<()> {
    let mut timestamp: Option<&str> = None;
    let mut provided: Option<&str> = None;
    for part in signature.split(',') {
        if let Some(ts) = part.strip_prefix("t=") {
            timestamp = Some(ts);
        } else if let Some(sig) = part.strip_prefix("v1=") {
            provided = Some(sig);
        }
    }
    let (timestamp, provided) = match (timestamp, provided) {
        (Some(t), Some(p)) => (t, p),
        _ => {
            return Err(AppError::InvalidInput(
                "Malformed webhook signature header".into(),
            ));
        }
    };

    let signed_content = format!("{}.{}", timestamp, body);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_content.as_bytes());

    let provided_bytes = hex::decode(provided)
        .map_err(|_| AppError::InvalidInput("Malformed webhook signature header".into()))?;
    mac.verify_slice(&provided_bytes)
        .map_err(|_| AppError::InvalidInput("Webhook signature mismatch".into()))
}

/// Counterpart of `verify_webhook_signature`, used by tests and local
/// tooling to produce valid headers.
pub fn sign_webhook_payload(secret: &str, timestamp: i64, body: &str) -> String {
    let signed_content = format!("{}.{}", timestamp, body);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_content.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}

// ============================================================================
// Outbound client
// ============================================================================

/// HTTP client for the payment processor. The engine only requests transfers
/// and reads balance state through it; timeouts surface as retryable
/// `ProcessorUnavailable`.
#[derive(Clone)]
pub struct ProcessorClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl ProcessorClient {
    pub fn new(base_url: Url, api_key: SecretString, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn map_request_error(err: reqwest::Error) -> AppError {
        if err.is_timeout() || err.is_connect() {
            AppError::ProcessorUnavailable(err.to_string())
        } else {
            AppError::Internal(format!("Processor request failed: {}", err))
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_server_error() {
            return Err(AppError::ProcessorUnavailable(format!(
                "Processor returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "Processor returned {}: {}",
                status, body
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid processor response: {}", e)))
    }
}

#[async_trait]
impl PaymentProcessorPort for ProcessorClient {
    async fn request_transfer(
        &self,
        payout_id: Uuid,
        provider_id: Uuid,
        amount_cents: i64,
        payout_type: PayoutType,
    ) -> AppResult<TransferAck> {
        let response = self
            .client
            .post(self.endpoint("/v1/transfers"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&serde_json::json!({
                "payout_id": payout_id,
                "provider_id": provider_id,
                "amount_cents": amount_cents,
                "method": payout_type.as_str(),
            }))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        self.handle_response(response).await
    }

    async fn fetch_balance(&self, provider_id: Uuid) -> AppResult<ProcessorBalance> {
        let response = self
            .client
            .get(self.endpoint(&format!("/v1/accounts/{}/balance", provider_id)))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(Self::map_request_error)?;

        self.handle_response(response).await
    }
}
