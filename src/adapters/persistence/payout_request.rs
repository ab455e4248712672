use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::payout::{PayoutRequest, PayoutStatus},
    use_cases::payout_scheduler::{
        PaginatedPayouts, PayoutRecord, PayoutRequestRepo, TransitionOutcome,
    },
};

fn row_to_payout(row: sqlx::postgres::PgRow) -> PayoutRequest {
    PayoutRequest {
        id: row.get("id"),
        provider_id: row.get("provider_id"),
        payout_type: row.get("payout_type"),
        amount_cents: row.get("amount_cents"),
        fee_cents: row.get("fee_cents"),
        status: row.get("status"),
        requested_at: row.get("requested_at"),
        expected_arrival: row.get("expected_arrival"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, provider_id, payout_type, amount_cents, fee_cents, status,
    requested_at, expected_arrival, updated_at
"#;

#[async_trait]
impl PayoutRequestRepo for PostgresPersistence {
    async fn create_covered(&self, record: &PayoutRecord) -> AppResult<PayoutRequest> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Row lock serializes concurrent payout requests for the same
        // provider; cross-provider requests proceed in parallel.
        let available: i64 = sqlx::query_scalar(
            "SELECT available_balance_cents FROM provider_accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(record.provider_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        // Still-requested payouts have not decremented the balance yet but
        // already claim headroom.
        let reserved: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM payout_requests
            WHERE provider_id = $1 AND status = 'requested'
            "#,
        )
        .bind(record.provider_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        if record.amount_cents + reserved > available {
            return Err(AppError::InsufficientBalance {
                requested: record.amount_cents,
                available: available - reserved,
            });
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payout_requests
                (id, provider_id, payout_type, amount_cents, fee_cents, status,
                 requested_at, expected_arrival)
            VALUES ($1, $2, $3, $4, $5, 'requested', $6, $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(record.id)
        .bind(record.provider_id)
        .bind(record.payout_type)
        .bind(record.amount_cents)
        .bind(record.fee_cents)
        .bind(record.requested_at)
        .bind(record.expected_arrival)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_payout(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PayoutRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payout_requests WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_payout))
    }

    async fn transition(
        &self,
        payout_id: Uuid,
        new_status: PayoutStatus,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let row = sqlx::query(
            "SELECT provider_id, amount_cents, status FROM payout_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(payout_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        let current: PayoutStatus = row.get("status");
        if !current.can_transition_to(new_status) {
            // Replay or out-of-order notification; nothing changes.
            return Ok(TransitionOutcome::Skipped);
        }

        // Confirmed processor acceptance is the only balance decrement.
        if current == PayoutStatus::Requested && new_status == PayoutStatus::InTransit {
            let provider_id: Uuid = row.get("provider_id");
            let amount_cents: i64 = row.get("amount_cents");
            let updated = sqlx::query(
                r#"
                UPDATE provider_accounts SET
                    available_balance_cents = available_balance_cents - $2,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                "#,
            )
            .bind(provider_id)
            .bind(amount_cents)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

            if updated.rows_affected() == 0 {
                return Err(AppError::Integrity(format!(
                    "Payout {} accepted for missing provider {}",
                    payout_id, provider_id
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE payout_requests SET
                status = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(payout_id)
        .bind(new_status)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(TransitionOutcome::Applied)
    }

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayouts> {
        let offset = (page - 1) * per_page;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payout_requests WHERE provider_id = $1")
                .bind(provider_id)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::from)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM payout_requests
            WHERE provider_id = $1
            ORDER BY requested_at DESC
            LIMIT $2 OFFSET $3
            "#,
            SELECT_COLS
        ))
        .bind(provider_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        let payouts: Vec<PayoutRequest> = rows.into_iter().map(row_to_payout).collect();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i32;

        Ok(PaginatedPayouts {
            payouts,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}
