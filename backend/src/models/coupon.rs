use super::validation::{clean_optional, parse_enum};
use crate::error::AppResult;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    CouponSeriesStatus("coupon series status") {
        Active => "active",
        Completed => "completed",
    }
}

impl CouponSeriesStatus {
    /// A series is completed once every coupon has been consumed.
    pub fn after_consumption(used_coupons: i32, total_coupons: i32) -> Self {
        if used_coupons >= total_coupons {
            CouponSeriesStatus::Completed
        } else {
            CouponSeriesStatus::Active
        }
    }
}

text_enum! {
    CouponStatus("coupon status") {
        Available => "available",
        Used => "used",
        Cancelled => "cancelled",
    }
}

/// Batch of one-hour coupons issued with a settlement note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CouponSeries {
    pub id: Uuid,
    pub family_id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub settlement_note_id: Uuid,
    pub total_coupons: i32,
    pub used_coupons: i32,
    /// Computed by the query as `total_coupons - used_coupons`
    pub remaining_coupons: i32,
    pub hourly_rate: Decimal,
    pub professor_salary: Decimal,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CouponSeries {
    pub fn status_enum(&self) -> CouponSeriesStatus {
        self.status.parse().unwrap_or(CouponSeriesStatus::Active)
    }

    pub fn is_active(&self) -> bool {
        self.status_enum() == CouponSeriesStatus::Active
    }
}

/// Single coupon, worth one hour of lesson
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub series_id: Uuid,
    pub code: String,
    pub number: i32,
    pub status: String,
    pub used_at: Option<NaiveDateTime>,
    pub professor_id: Option<Uuid>,
    pub session_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Coupon {
    pub fn status_enum(&self) -> CouponStatus {
        self.status.parse().unwrap_or(CouponStatus::Available)
    }

    pub fn is_available(&self) -> bool {
        self.status_enum() == CouponStatus::Available
    }
}

/// Coupon code: first eight hex digits of the series id, then the
/// three-digit coupon number, e.g. `3F2A9C1B-007`.
pub fn coupon_code(series_id: &Uuid, number: i32) -> String {
    let simple = series_id.simple().to_string().to_uppercase();
    format!("{}-{:03}", &simple[..8], number)
}

#[derive(Debug, Clone, Serialize)]
pub struct CouponSeriesDetail {
    #[serde(flatten)]
    pub series: CouponSeries,
    pub coupons: Vec<Coupon>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UseCouponInput {
    pub professor_id: Option<Uuid>,
    pub session_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponSeriesFilter {
    pub family_id: Option<Uuid>,
    pub status: Option<String>,
}

impl CouponSeriesFilter {
    pub fn status(&self) -> AppResult<Option<CouponSeriesStatus>> {
        clean_optional(&self.status).map(|s| parse_enum(&s)).transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponFilter {
    pub series_id: Option<Uuid>,
    pub status: Option<String>,
}

impl CouponFilter {
    pub fn status(&self) -> AppResult<Option<CouponStatus>> {
        clean_optional(&self.status).map(|s| parse_enum(&s)).transpose()
    }
}
