use super::extract::{JsonBody, PathParam};
use crate::auth::{self, Claims};
use crate::error::AppResult;
use crate::models::{NewUser, UpdateUser, User};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use uuid::Uuid;

/// User management, admin only
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", patch(update_user).delete(delete_user))
        .route_layer(middleware::from_fn(auth::admin_only))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.user_service.list().await?))
}

async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.user_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<UpdateUser>,
) -> AppResult<Json<User>> {
    Ok(Json(state.user_service.update(id, body).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<StatusCode> {
    state.user_service.delete(claims.sub, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
