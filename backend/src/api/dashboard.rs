use crate::error::AppResult;
use crate::models::DashboardStats;
use crate::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/stats", get(stats))
}

async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard_service.stats().await?))
}
