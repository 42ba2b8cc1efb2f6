use crate::error::{AppError, AppResult};
use crate::models::{
    Coupon, CouponFilter, CouponSeries, CouponSeriesDetail, CouponSeriesFilter, UseCouponInput,
};
use crate::repositories::{CouponRepository, ProfessorRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for coupon series and coupon consumption
pub struct CouponService {
    coupon_repo: Arc<CouponRepository>,
    professor_repo: Arc<ProfessorRepository>,
}

impl CouponService {
    pub fn new(coupon_repo: Arc<CouponRepository>, professor_repo: Arc<ProfessorRepository>) -> Self {
        Self {
            coupon_repo,
            professor_repo,
        }
    }

    pub async fn list_series(&self, filter: &CouponSeriesFilter) -> AppResult<Vec<CouponSeries>> {
        let status = filter.status()?;
        Ok(self.coupon_repo.list_series(filter.family_id, status).await?)
    }

    /// Series with all of its coupons
    pub async fn get_series(&self, id: Uuid) -> AppResult<CouponSeriesDetail> {
        let series = self
            .coupon_repo
            .find_series(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Coupon series {} not found", id)))?;
        let coupons = self.coupon_repo.list_coupons(Some(id), None).await?;

        Ok(CouponSeriesDetail { series, coupons })
    }

    pub async fn list_coupons(&self, filter: &CouponFilter) -> AppResult<Vec<Coupon>> {
        let status = filter.status()?;
        Ok(self.coupon_repo.list_coupons(filter.series_id, status).await?)
    }

    /// Record a lesson against a coupon
    pub async fn use_coupon(&self, id: Uuid, input: UseCouponInput) -> AppResult<Coupon> {
        if let Some(professor_id) = input.professor_id {
            if self.professor_repo.find_by_id(professor_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Professor {} not found",
                    professor_id
                )));
            }
        }

        let (coupon, series) = self.coupon_repo.use_coupon(id, &input).await?;
        info!(
            "Coupon {} used, series {} has {} remaining",
            coupon.code, series.id, series.remaining_coupons
        );
        if !series.is_active() {
            info!("Coupon series {} completed", series.id);
        }

        Ok(coupon)
    }

    pub async fn cancel_coupon(&self, id: Uuid) -> AppResult<Coupon> {
        let (coupon, series) = self.coupon_repo.cancel_coupon(id).await?;
        info!(
            "Coupon {} cancelled, series {} has {} remaining",
            coupon.code, series.id, series.remaining_coupons
        );

        Ok(coupon)
    }
}
