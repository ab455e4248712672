use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{is_unique_violation, PostgresPersistence},
    app_error::{AppError, AppResult},
    domain::entities::referral_credit::ReferralCredit,
    use_cases::referral_credits::{
        select_redeemable, MonthlyCreditExpense, NewCredit, ReferralCreditRepo,
    },
};

fn row_to_credit(row: sqlx::postgres::PgRow) -> ReferralCredit {
    ReferralCredit {
        id: row.get("id"),
        external_id: row.get("external_id"),
        referrer_id: row.get("referrer_id"),
        amount_cents: row.get("amount_cents"),
        status: row.get("status"),
        issued_at: row.get("issued_at"),
        redeemed_at: row.get("redeemed_at"),
        expired_at: row.get("expired_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, external_id, referrer_id, amount_cents, status,
    issued_at, redeemed_at, expired_at
"#;

#[async_trait]
impl ReferralCreditRepo for PostgresPersistence {
    async fn insert(
        &self,
        credit: &NewCredit,
        issued_at: DateTime<Utc>,
    ) -> AppResult<ReferralCredit> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO referral_credits
                (id, external_id, referrer_id, amount_cents, status, issued_at)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(&credit.external_id)
        .bind(credit.referrer_id)
        .bind(credit.amount_cents)
        .bind(issued_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::DuplicateEvent(credit.external_id.clone())
            } else {
                AppError::from(err)
            }
        })?;

        Ok(row_to_credit(row))
    }

    async fn redeem_pending_fifo(
        &self,
        referrer_id: Uuid,
        up_to_amount_cents: i64,
        redeemed_at: DateTime<Utc>,
    ) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Row locks serialize concurrent redemptions for the same referrer.
        let rows = sqlx::query(
            r#"
            SELECT id, amount_cents
            FROM referral_credits
            WHERE referrer_id = $1 AND status = 'pending'
            ORDER BY issued_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(referrer_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let candidates: Vec<(Uuid, i64)> = rows
            .iter()
            .map(|row| (row.get("id"), row.get("amount_cents")))
            .collect();
        let (selected, redeemed_cents) = select_redeemable(&candidates, up_to_amount_cents);

        if !selected.is_empty() {
            let updated = sqlx::query(
                r#"
                UPDATE referral_credits SET
                    status = 'redeemed',
                    redeemed_at = $2
                WHERE id = ANY($1) AND status = 'pending'
                "#,
            )
            .bind(&selected)
            .bind(redeemed_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

            if updated.rows_affected() != selected.len() as u64 {
                // Locked rows changed under us; committing would redeem an
                // amount that disagrees with what we report.
                return Err(AppError::Integrity(format!(
                    "Redeemed {} of {} selected credits for referrer {}",
                    updated.rows_affected(),
                    selected.len(),
                    referrer_id
                )));
            }
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(redeemed_cents)
    }

    async fn sum_outstanding(&self) -> AppResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM referral_credits WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(sum)
    }

    async fn monthly_expense(&self, year: i32, month: u32) -> AppResult<MonthlyCreditExpense> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(amount_cents) FILTER (
                    WHERE EXTRACT(YEAR FROM issued_at)::int = $1
                      AND EXTRACT(MONTH FROM issued_at)::int = $2
                ), 0) as issued_cents,
                COALESCE(SUM(amount_cents) FILTER (
                    WHERE redeemed_at IS NOT NULL
                      AND EXTRACT(YEAR FROM redeemed_at)::int = $1
                      AND EXTRACT(MONTH FROM redeemed_at)::int = $2
                ), 0) as redeemed_cents
            FROM referral_credits
            "#,
        )
        .bind(year)
        .bind(month as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(MonthlyCreditExpense {
            issued_cents: row.get("issued_cents"),
            redeemed_cents: row.get("redeemed_cents"),
        })
    }

    async fn expire_issued_before(
        &self,
        cutoff: DateTime<Utc>,
        expired_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE referral_credits SET
                status = 'expired',
                expired_at = $2
            WHERE status = 'pending' AND issued_at < $1
            "#,
        )
        .bind(cutoff)
        .bind(expired_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn list_by_referrer(&self, referrer_id: Uuid) -> AppResult<Vec<ReferralCredit>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM referral_credits WHERE referrer_id = $1 ORDER BY issued_at ASC",
            SELECT_COLS
        ))
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_credit).collect())
    }
}
