use super::extract::{JsonBody, PathParam, QueryParams};
use crate::error::AppResult;
use crate::models::{
    Coupon, CouponFilter, CouponSeries, CouponSeriesDetail, CouponSeriesFilter, UseCouponInput,
};
use crate::AppState;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/coupon-series", get(list_series))
        .route("/coupon-series/{id}", get(get_series))
        .route("/coupons", get(list_coupons))
        .route("/coupons/{id}/use", post(use_coupon))
        .route("/coupons/{id}/cancel", post(cancel_coupon))
}

async fn list_series(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CouponSeriesFilter>,
) -> AppResult<Json<Vec<CouponSeries>>> {
    Ok(Json(state.coupon_service.list_series(&filter).await?))
}

async fn get_series(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<CouponSeriesDetail>> {
    Ok(Json(state.coupon_service.get_series(id).await?))
}

async fn list_coupons(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CouponFilter>,
) -> AppResult<Json<Vec<Coupon>>> {
    Ok(Json(state.coupon_service.list_coupons(&filter).await?))
}

async fn use_coupon(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<UseCouponInput>,
) -> AppResult<Json<Coupon>> {
    Ok(Json(state.coupon_service.use_coupon(id, body).await?))
}

async fn cancel_coupon(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<Coupon>> {
    Ok(Json(state.coupon_service.cancel_coupon(id).await?))
}
