//! REST routes.
//!
//! `/health` and `/health/db` are public, as is `POST /api/auth/login`.
//! Every other `/api` route requires a bearer token.

pub mod auth;
pub mod coupons;
pub mod dashboard;
pub mod extract;
pub mod families;
pub mod professors;
pub mod settlement_notes;
pub mod students;
pub mod subjects;
pub mod users;

use crate::error::AppResult;
use crate::AppState;
use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(subjects::routes())
        .merge(families::routes())
        .merge(students::routes())
        .merge(professors::routes())
        .merge(settlement_notes::routes())
        .merge(coupons::routes())
        .merge(dashboard::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        .nest("/api", api)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "abc-crm-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_db(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.database.ping().await?;
    Ok(Json(json!({ "status": "ok", "database": "reachable" })))
}
