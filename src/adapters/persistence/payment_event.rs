use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::{
    adapters::persistence::{is_unique_violation, PostgresPersistence},
    app_error::{AppError, AppResult},
    domain::entities::payment_event::{PaymentEvent, SettlementState},
    use_cases::revenue_ledger::{
        PaginatedPayments, PaymentEventRepo, PaymentRecord, RevenueSummary,
    },
};

fn row_to_event(row: sqlx::postgres::PgRow) -> PaymentEvent {
    PaymentEvent {
        id: row.get("id"),
        provider_id: row.get("provider_id"),
        gross_amount_cents: row.get("gross_amount_cents"),
        fee_amount_cents: row.get("fee_amount_cents"),
        fee_bps: row.get("fee_bps"),
        settlement: row.get("settlement"),
        occurred_at: row.get("occurred_at"),
        recorded_at: row.get("recorded_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, provider_id, gross_amount_cents, fee_amount_cents, fee_bps,
    settlement, occurred_at, recorded_at
"#;

#[async_trait]
impl PaymentEventRepo for PostgresPersistence {
    async fn record(&self, record: &PaymentRecord) -> AppResult<PaymentEvent> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payment_events
                (id, provider_id, gross_amount_cents, fee_amount_cents, fee_bps,
                 settlement, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(&record.id)
        .bind(record.provider_id)
        .bind(record.gross_amount_cents)
        .bind(record.fee_amount_cents)
        .bind(record.fee_bps)
        .bind(record.settlement)
        .bind(record.occurred_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::DuplicateEvent(record.id.clone())
            } else {
                AppError::from(err)
            }
        })?;

        let event = row_to_event(row);

        // Net amount lands in the bucket matching the settlement state. Same
        // transaction as the insert: a fee must never exist without its
        // event, nor a balance change without either.
        let balance_column = if record.settlement.is_settled() {
            "available_balance_cents"
        } else {
            "pending_balance_cents"
        };
        let updated = sqlx::query(&format!(
            r#"
            UPDATE provider_accounts SET
                {col} = {col} + $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
            col = balance_column
        ))
        .bind(record.provider_id)
        .bind(event.net_amount_cents())
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        if updated.rows_affected() == 0 {
            // The provider vanished between the use-case lookup and this
            // write; committing would strand a fee with no balance effect.
            return Err(AppError::Integrity(format!(
                "Payment {} recorded for missing provider {}",
                event.id, record.provider_id
            )));
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(event)
    }

    async fn sum_fees_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(fee_amount_cents), 0)
            FROM payment_events
            WHERE occurred_at > $1 AND occurred_at <= $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(sum)
    }

    async fn summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<RevenueSummary> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT \
                COALESCE(SUM(gross_amount_cents), 0) as gross_cents, \
                COALESCE(SUM(fee_amount_cents), 0) as fee_cents, \
                COUNT(*) as payment_count \
             FROM payment_events WHERE 1 = 1",
        );
        if let Some(from) = &from {
            builder.push(" AND occurred_at >= ").push_bind(*from);
        }
        if let Some(to) = &to {
            builder.push(" AND occurred_at <= ").push_bind(*to);
        }

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(RevenueSummary {
            gross_cents: row.get("gross_cents"),
            fee_cents: row.get("fee_cents"),
            payment_count: row.get("payment_count"),
        })
    }

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        page: i32,
        per_page: i32,
    ) -> AppResult<PaginatedPayments> {
        let offset = (page - 1) * per_page;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payment_events WHERE provider_id = $1")
                .bind(provider_id)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::from)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM payment_events
            WHERE provider_id = $1
            ORDER BY occurred_at DESC
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

        let payments: Vec<PaymentEvent> = rows.into_iter().map(row_to_event).collect();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i32;

        Ok(PaginatedPayments {
            payments,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}
