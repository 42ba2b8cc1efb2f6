use super::extract::JsonBody;
use crate::auth::Claims;
use crate::error::AppResult;
use crate::models::User;
use crate::services::{LoginRequest, LoginResponse};
use crate::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};

/// Authenticated auth routes. Login itself is mounted outside the token layer.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(state.auth_service.login(body).await?))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<User>> {
    Ok(Json(state.auth_service.current_user(&claims).await?))
}
