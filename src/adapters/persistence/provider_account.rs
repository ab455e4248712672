use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::{
        plan_tier::PlanTier,
        provider_account::{ProviderAccount, SubscriptionStatus},
    },
    use_cases::revenue_ledger::ProviderAccountRepo,
};

fn row_to_account(row: sqlx::postgres::PgRow) -> ProviderAccount {
    ProviderAccount {
        id: row.get("id"),
        current_tier: row.get("current_tier"),
        subscription_status: row.get("subscription_status"),
        payout_delay_days: row.get("payout_delay_days"),
        instant_payout_eligible: row.get("instant_payout_eligible"),
        available_balance_cents: row.get("available_balance_cents"),
        pending_balance_cents: row.get("pending_balance_cents"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, current_tier, subscription_status, payout_delay_days,
    instant_payout_eligible, available_balance_cents, pending_balance_cents,
    created_at, updated_at
"#;

#[async_trait]
impl ProviderAccountRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ProviderAccount>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM provider_accounts WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_account))
    }

    async fn upsert_subscription(
        &self,
        provider_id: Uuid,
        tier: Option<PlanTier>,
        status: SubscriptionStatus,
    ) -> AppResult<()> {
        // COALESCE keeps the existing tier on cancellation (tier = NULL) so
        // the last tier stays available for reporting.
        sqlx::query(
            r#"
            INSERT INTO provider_accounts
                (id, current_tier, subscription_status)
            VALUES ($1, COALESCE($2, 'free'), $3)
            ON CONFLICT (id) DO UPDATE SET
                current_tier = COALESCE($2, provider_accounts.current_tier),
                subscription_status = EXCLUDED.subscription_status,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(provider_id)
        .bind(tier)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn count_active_by_tier(&self) -> AppResult<Vec<(PlanTier, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT current_tier, COUNT(*) as provider_count
            FROM provider_accounts
            WHERE subscription_status = 'active'
            GROUP BY current_tier
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        let mut counts: Vec<(PlanTier, i64)> = PlanTier::ALL.iter().map(|t| (*t, 0)).collect();
        for row in rows {
            let tier: PlanTier = row.get("current_tier");
            let count: i64 = row.get("provider_count");
            if let Some(entry) = counts.iter_mut().find(|(t, _)| *t == tier) {
                entry.1 = count;
            }
        }
        Ok(counts)
    }

    async fn list_ids(&self) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM provider_accounts ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }

    async fn apply_balance_snapshot(
        &self,
        provider_id: Uuid,
        available_cents: i64,
        pending_cents: i64,
        instant_payout_eligible: bool,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE provider_accounts SET
                available_balance_cents = $2,
                pending_balance_cents = $3,
                instant_payout_eligible = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(provider_id)
        .bind(available_cents)
        .bind(pending_cents)
        .bind(instant_payout_eligible)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
