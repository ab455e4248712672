use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    use_cases::revenue_ledger::LedgerEventRepo,
};

#[async_trait]
impl LedgerEventRepo for PostgresPersistence {
    async fn record(
        &self,
        event_id: &str,
        event_type: &str,
        provider_id: Option<Uuid>,
        payload: &serde_json::Value,
    ) -> AppResult<()> {
        // ON CONFLICT DO NOTHING: concurrent deliveries of the same event
        // both reach here after passing the exists() check; the second
        // insert is a harmless no-op.
        sqlx::query(
            r#"
            INSERT INTO ledger_events (event_id, event_type, provider_id, payload)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(provider_id)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn exists(&self, event_id: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ledger_events WHERE event_id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(exists)
    }
}
