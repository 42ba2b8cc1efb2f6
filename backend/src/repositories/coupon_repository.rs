use crate::error::RepositoryError;
use crate::models::validation::clean_optional;
use crate::models::{
    Coupon, CouponSeries, CouponSeriesStatus, CouponStatus, UseCouponInput,
};
use sqlx::PgPool;
use uuid::Uuid;

const SERIES_COLUMNS: &str = r#"
    id, family_id, student_id, subject_id, settlement_note_id,
    total_coupons, used_coupons, (total_coupons - used_coupons) AS remaining_coupons,
    hourly_rate, professor_salary, status, created_at, updated_at
"#;

const COUPON_COLUMNS: &str = r#"
    id, series_id, code, number, status, used_at, professor_id,
    session_date, notes, created_at, updated_at
"#;

/// Repository for coupon series and their coupons
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    /// Create a new CouponRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_series(&self, id: Uuid) -> Result<Option<CouponSeries>, RepositoryError> {
        let series = sqlx::query_as::<_, CouponSeries>(&format!(
            "SELECT {} FROM coupon_series WHERE id = $1",
            SERIES_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(series)
    }

    pub async fn list_series(
        &self,
        family_id: Option<Uuid>,
        status: Option<CouponSeriesStatus>,
    ) -> Result<Vec<CouponSeries>, RepositoryError> {
        let series = sqlx::query_as::<_, CouponSeries>(&format!(
            r#"
            SELECT {} FROM coupon_series
            WHERE ($1::uuid IS NULL OR family_id = $1)
                AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            SERIES_COLUMNS
        ))
        .bind(family_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    pub async fn find_coupon(&self, id: Uuid) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE id = $1",
            COUPON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Coupons in series order, optionally narrowed to one series and/or status
    pub async fn list_coupons(
        &self,
        series_id: Option<Uuid>,
        status: Option<CouponStatus>,
    ) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            SELECT {} FROM coupons
            WHERE ($1::uuid IS NULL OR series_id = $1)
                AND ($2::text IS NULL OR status = $2)
            ORDER BY series_id, number
            "#,
            COUPON_COLUMNS
        ))
        .bind(series_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Record a lesson against an available coupon
    pub async fn use_coupon(
        &self,
        id: Uuid,
        usage: &UseCouponInput,
    ) -> Result<(Coupon, CouponSeries), RepositoryError> {
        self.consume(id, CouponStatus::Used, Some(usage)).await
    }

    /// Void an available coupon. It still counts against the series.
    pub async fn cancel_coupon(&self, id: Uuid) -> Result<(Coupon, CouponSeries), RepositoryError> {
        self.consume(id, CouponStatus::Cancelled, None).await
    }

    /// Move an available coupon of an active series to `outcome` and bump
    /// the series counter. Locks the series before the coupon, the same
    /// order a note deletion takes them in.
    async fn consume(
        &self,
        id: Uuid,
        outcome: CouponStatus,
        usage: Option<&UseCouponInput>,
    ) -> Result<(Coupon, CouponSeries), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let series_id = sqlx::query_scalar::<_, Uuid>("SELECT series_id FROM coupons WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Coupon {} not found", id)))?;

        let series = sqlx::query_as::<_, CouponSeries>(&format!(
            "SELECT {} FROM coupon_series WHERE id = $1 FOR UPDATE",
            SERIES_COLUMNS
        ))
        .bind(series_id)
        .fetch_one(&mut *tx)
        .await?;

        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE id = $1 FOR UPDATE",
            COUPON_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if !coupon.is_available() {
            return Err(RepositoryError::BusinessRule(format!(
                "Coupon {} is {}, not available",
                coupon.code, coupon.status
            )));
        }
        if !series.is_active() {
            return Err(RepositoryError::BusinessRule(format!(
                "Coupon series {} is {}",
                series.id, series.status
            )));
        }

        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            UPDATE coupons
            SET status = $2,
                used_at = CASE WHEN $2 = 'used' THEN NOW() ELSE used_at END,
                professor_id = $3,
                session_date = $4,
                notes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COUPON_COLUMNS
        ))
        .bind(id)
        .bind(outcome.as_str())
        .bind(usage.and_then(|u| u.professor_id))
        .bind(usage.and_then(|u| u.session_date))
        .bind(usage.and_then(|u| clean_optional(&u.notes)))
        .fetch_one(&mut *tx)
        .await?;

        let used_coupons = series.used_coupons + 1;
        let status = CouponSeriesStatus::after_consumption(used_coupons, series.total_coupons);
        let series = sqlx::query_as::<_, CouponSeries>(&format!(
            r#"
            UPDATE coupon_series
            SET used_coupons = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SERIES_COLUMNS
        ))
        .bind(series_id)
        .bind(used_coupons)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((coupon, series))
    }

    /// Coupons still available across active series
    pub async fn remaining_total(&self) -> Result<i64, RepositoryError> {
        let remaining = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(total_coupons - used_coupons), 0)::bigint
            FROM coupon_series
            WHERE status = $1
            "#,
        )
        .bind(CouponSeriesStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(remaining)
    }
}
